use std::path::Path;

/// Loads `.env` files into the process environment.
///
/// The crate-local file is read first, then `./.env`; variables that are
/// already set are never overwritten.
pub fn init() {
    let _ = dotenvy::from_path(Path::new(
        format!("{}/.env", env!("CARGO_MANIFEST_DIR")).as_str(),
    ));
    dotenvy::dotenv().ok();
}
