/// Middleware modules for the API server
///
/// Session authentication lives in `app` as a `from_fn_with_state` layer;
/// this module holds the standalone tower layers.

pub mod security;
