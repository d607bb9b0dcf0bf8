use crate::batch::discover_inputs;
use crate::config::Config;
use console::style;
use dialoguer::{Confirm, Input};
use std::fs;
use std::path::{Path, PathBuf};

pub struct InteractiveResult {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: Config,
}

/// Terminal wizard: prompts for the input folder, output folder and volume
/// threshold, then asks for confirmation.
pub fn run_interactive_wizard() -> anyhow::Result<InteractiveResult> {
    print_header();

    let mut config = Config::load().unwrap_or_default();

    let (input_dir, file_count) = select_input_folder()?;
    let output_dir = select_output_folder(&input_dir)?;

    let threshold: f64 = Input::new()
        .with_prompt("Volume threshold (0-10)")
        .default(config.volume_percentage)
        .validate_with(|value: &f64| {
            if (0.0..=10.0).contains(value) {
                Ok(())
            } else {
                Err("threshold must be between 0 and 10")
            }
        })
        .interact_text()?;
    config.volume_percentage = threshold;

    print_summary(&input_dir, &output_dir, file_count, threshold);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    if Confirm::new()
        .with_prompt("Save threshold to config file?")
        .default(false)
        .interact()?
    {
        save_config(&config)?;
        println!("{} Settings saved\n", style("✓").green());
    }

    println!();

    Ok(InteractiveResult {
        input_dir,
        output_dir,
        config,
    })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║          quietcut - silence batch trimmer         ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn select_input_folder() -> anyhow::Result<(PathBuf, usize)> {
    loop {
        let path: String = Input::new()
            .with_prompt("Input folder")
            .interact_text()?;
        let path = PathBuf::from(path.trim());

        if !path.is_dir() {
            println!(
                "{} Not a folder: {}",
                style("✗").red(),
                path.display()
            );
            continue;
        }

        let count = discover_inputs(&path).map(|f| f.len()).unwrap_or(0);
        if count == 0 {
            println!(
                "{} No .mp4 or .mkv files in {}",
                style("!").yellow(),
                path.display()
            );
            continue;
        }

        println!("{} {} video files found", style("✓").green(), count);
        return Ok((path, count));
    }
}

fn select_output_folder(input_dir: &Path) -> anyhow::Result<PathBuf> {
    let suggested = default_output_dir(input_dir);

    let path: String = Input::new()
        .with_prompt("Output folder")
        .default(suggested.display().to_string())
        .interact_text()?;

    Ok(PathBuf::from(path.trim()))
}

/// Suggested output folder: a `trimmed` subfolder of the input folder.
fn default_output_dir(input_dir: &Path) -> PathBuf {
    input_dir.join("trimmed")
}

fn save_config(config: &Config) -> anyhow::Result<()> {
    if let Some(config_dir) = dirs::config_dir() {
        let quietcut_dir = config_dir.join("quietcut");
        fs::create_dir_all(&quietcut_dir)?;

        let config_path = quietcut_dir.join("config.toml");
        let toml_content = toml::to_string_pretty(config)?;
        fs::write(config_path, toml_content)?;
    }
    Ok(())
}

fn print_summary(input_dir: &Path, output_dir: &Path, file_count: usize, threshold: f64) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Input:      {}", style(input_dir.display()).cyan());
    println!("  Output:     {}", style(output_dir.display()).cyan());
    println!("  Files:      {}", file_count);
    println!("  Threshold:  {}", threshold);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/videos")),
            PathBuf::from("/videos/trimmed")
        );
    }
}
