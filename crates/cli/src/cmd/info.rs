use anyhow::{Context, Result};
use serde_json::json;

use extforge_lib::RuntimeVersion;
use extforge_lib::platform::Platform;

use crate::output::{OutputFormat, print_field, print_json, print_warning};

pub fn cmd_info(python: &str, output: OutputFormat) -> Result<()> {
  let platform = Platform::current();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let version = rt.block_on(RuntimeVersion::detect(python));

  if output.is_json() {
    return print_json(&json!({
      "version": env!("CARGO_PKG_VERSION"),
      "platform": platform.map(|p| p.triple()),
      "extension_suffix": platform.map(|p| p.os.extension_suffix()),
      "interpreter": python,
      "runtime_version": version.as_ref().ok(),
    }));
  }

  println!("extforge v{}", env!("CARGO_PKG_VERSION"));
  match platform {
    Some(platform) => {
      print_field("Platform", platform);
      print_field("Extension suffix", platform.os.extension_suffix());
    }
    None => print_warning("Could not detect platform."),
  }
  match version {
    Ok(version) => print_field("Python", format!("{} ({})", version, python)),
    Err(err) => print_warning(&format!("Could not detect Python version: {}", err)),
  }

  Ok(())
}
