mod support;

use hwyla::config::{self, CopyFormat};
use hwyla::app_dirs;
use support::HwylaEnvGuard;
use tempfile::tempdir;

#[test]
fn config_home_relocates_settings_and_models() {
    let dir = tempdir().unwrap();
    let _guard = HwylaEnvGuard::set_config_home(dir.path().to_path_buf());

    let root = app_dirs::app_root_dir().unwrap();
    assert!(root.starts_with(dir.path()));
    std::fs::write(
        config::config_path().unwrap(),
        "[recognition]\ntop_k = 4\n\n[ui]\ncopy_format = \"command\"\n",
    )
    .unwrap();

    let cfg = config::load_or_default().unwrap();
    assert_eq!(cfg.recognition.top_k, 4);
    assert_eq!(cfg.ui.copy_format, CopyFormat::Command);

    let models = app_dirs::models_dir().unwrap();
    assert!(models.is_dir());
    assert!(models.starts_with(&root));
}

#[test]
fn missing_config_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let _guard = HwylaEnvGuard::set_config_home(dir.path().to_path_buf());

    let cfg = config::load_or_default().unwrap();
    assert_eq!(cfg.recognition.top_k, 10);
    assert_eq!(cfg.ui.copy_format, CopyFormat::Glyph);
}
