use std::path::{Path, PathBuf};

/// Initializes logging for a demo and prepares its output folder.
///
/// Returns the path of the main `.tex` file inside `output_folder`.
pub fn setup_io(
    output_folder: impl AsRef<Path>,
    main_name: &str,
) -> Result<PathBuf, std::io::Error> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    // documents never create their folder themselves
    std::fs::create_dir_all(output_folder.as_ref())?;
    Ok(output_folder.as_ref().join(main_name))
}
