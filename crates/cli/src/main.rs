use doc_crop_core::{
    analysis::{AnalysisEvent, AnalysisHandle, AnalysisReport, AnalysisSchedule},
    config::Config,
    image_processing::{ExportedImage, ImageProcessor, SourceImage},
    init, ui,
    wizard::{AnalysisOption, Wizard},
    RegionSelector, ScreenPreset, SelectionHost, SelectorConfig, Theme,
};
use anyhow::{anyhow, bail, Context, Result};
use arboard::Clipboard;
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use termimad::crossterm::style::Color;
use termimad::MadSkin;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop an image headlessly by replaying pointer drags
    Crop {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Pointer drag in viewport pixels, as FROM_X,FROM_Y:TO_X,TO_Y (repeatable)
        #[arg(long = "drag", value_name = "X0,Y0:X1,Y1")]
        drags: Vec<Drag>,

        /// Reset the selection to the centered default after the drags
        #[arg(long)]
        reset: bool,

        /// Where to write the cropped JPEG
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the rendered selector frame as PNG
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Copy the cropped image to the clipboard as a data URL
        #[arg(short, long, default_value_t = false)]
        copy: bool,
    },

    /// Crop an image in a desktop window
    Interactive {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Where to write the cropped JPEG
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the full document wizard: upload, crop, review, analysis, report
    Analyze {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Crop in a desktop window instead of using the default selection
        #[arg(short, long)]
        interactive: bool,

        /// Analysis to request (repeatable): fraud, text, metadata, signature
        #[arg(long = "option", value_name = "NAME")]
        options: Vec<String>,

        /// Run the mocked timers twenty times faster
        #[arg(long)]
        fast: bool,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct SelectorArgs {
    /// Image to crop (PNG or JPEG)
    image: PathBuf,

    /// Hosting screen: crop (600x400) or select (700x500)
    #[arg(long)]
    screen: Option<String>,

    /// Override the screen's theme: flat or glow
    #[arg(long)]
    theme: Option<String>,

    /// Let corner handles resize the selection
    #[arg(long)]
    resizable: bool,
}

/// One pointer drag: press at `from`, move to `to`, release.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    from: (f32, f32),
    to: (f32, f32),
}

impl FromStr for Drag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (from, to) = s
            .split_once(':')
            .ok_or_else(|| format!("expected X0,Y0:X1,Y1, got '{}'", s))?;
        Ok(Self {
            from: parse_point(from)?,
            to: parse_point(to)?,
        })
    }
}

fn parse_point(s: &str) -> std::result::Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|_| format!("'{}' is not a number", v.trim()))
    };
    Ok((coord(x)?, coord(y)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = Config::load().context("Failed to load configuration")?;
    log::debug!("Loaded configuration: {:?}", config);

    match args.command {
        Command::Crop {
            selector,
            drags,
            reset,
            output,
            preview,
            copy,
        } => {
            let selector_config = resolve_selector(&config, &selector)?;
            let source = open_image(&selector.image)?;
            let mut region = RegionSelector::with_image(selector_config, source)?;

            for drag in &drags {
                region.pointer_down(drag.from.0, drag.from.1);
                region.pointer_move(drag.to.0, drag.to.1);
                region.pointer_up();
            }
            if reset {
                region.reset();
            }

            if let Some(path) = preview {
                let frame = region
                    .frame()
                    .ok_or_else(|| anyhow!("Selector has no frame to preview"))?;
                let png = ImageProcessor::encode_png(frame)?;
                fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Preview written to {}", path.display());
            }

            if let Some(rect) = region.selection() {
                println!(
                    "Selection: x={:.1} y={:.1} width={:.1} height={:.1}",
                    rect.x, rect.y, rect.width, rect.height
                );
            }

            let mut host = Collected::default();
            region.confirm(&mut host).context("Failed to export selection")?;
            let exported = host
                .exported
                .ok_or_else(|| anyhow!("Selector finished without an image"))?;

            let output = output.unwrap_or_else(|| default_output(&selector.image));
            write_export(&exported, &output)?;

            if copy {
                copy_to_clipboard(&exported);
            }
        }

        Command::Interactive { selector, output } => {
            let selector_config = resolve_selector(&config, &selector)?;
            let source = open_image(&selector.image)?;

            match ui::run_selector_ui(source, selector_config)? {
                Some(exported) => {
                    let output = output.unwrap_or_else(|| default_output(&selector.image));
                    write_export(&exported, &output)?;
                }
                None => println!("Selection cancelled"),
            }
        }

        Command::Analyze {
            selector,
            interactive,
            options,
            fast,
            json,
        } => {
            let selector_config = resolve_selector(&config, &selector)?;
            let schedule = if fast {
                AnalysisSchedule::fast()
            } else {
                AnalysisSchedule::default()
            };
            let options = options
                .iter()
                .map(|o| o.parse::<AnalysisOption>())
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let Some(report) =
                run_wizard(&selector.image, selector_config, schedule, options, interactive).await?
            else {
                println!("Selection cancelled");
                return Ok(());
            };

            if json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

/// Merges CLI flags over the loaded configuration.
fn resolve_selector(config: &Config, args: &SelectorArgs) -> Result<SelectorConfig> {
    let mut config = config.clone();
    if let Some(screen) = &args.screen {
        config.screen = screen.parse::<ScreenPreset>()?;
    }
    if let Some(theme) = &args.theme {
        config.theme = Some(theme.parse::<Theme>()?);
    }
    if args.resizable {
        config.resizable = true;
    }
    Ok(config.selector())
}

fn open_image(path: &Path) -> Result<SourceImage> {
    ImageProcessor::open(path).with_context(|| format!("Failed to open image {}", path.display()))
}

fn default_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    image.with_file_name(format!("{}-cropped.jpg", stem))
}

fn write_export(exported: &ExportedImage, path: &Path) -> Result<()> {
    exported
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "Cropped {}x{} image written to {}",
        exported.width,
        exported.height,
        path.display()
    );
    Ok(())
}

/// Walks the wizard from upload to result.
///
/// Returns `None` when the user cancels cropping.
async fn run_wizard(
    image: &Path,
    selector_config: SelectorConfig,
    schedule: AnalysisSchedule,
    options: Vec<AnalysisOption>,
    interactive: bool,
) -> Result<Option<AnalysisReport>> {
    let mut wizard = Wizard::new();
    if !options.is_empty() {
        wizard.set_options(options);
    }

    // Upload
    let upload = new_spinner("Uploading document...")?;
    let source = open_image(image)?;
    tokio::time::sleep(schedule.upload_delay).await;
    upload.finish_and_clear();
    wizard.select_file(source.clone())?;

    // Crop
    if interactive {
        match ui::run_selector_ui(source, selector_config)? {
            Some(exported) => wizard.on_selection_complete(exported),
            None => {
                wizard.on_cancel();
                return Ok(None);
            }
        }
    } else {
        let mut selector = RegionSelector::with_image(selector_config, source)?;
        selector.confirm(&mut wizard)?;
    }

    if let Some(cropped) = wizard.cropped() {
        println!("Cropped to {}x{}", cropped.width, cropped.height);
    }
    let labels: Vec<&str> = wizard.options().iter().map(|o| o.label()).collect();
    println!("Requested: {}", labels.join(", "));

    // Processing
    wizard.start_analysis()?;
    let handle = AnalysisHandle::spawn(schedule, wizard.options().to_vec());
    let progress = new_spinner("Starting analysis...")?;

    // The handle's channel blocks, so follow it off the async workers.
    let report = {
        let progress = progress.clone();
        tokio::task::spawn_blocking(move || follow_analysis(&handle, &progress))
            .await
            .context("Analysis watcher panicked")?
    };
    progress.finish_and_clear();

    let report = report?;
    wizard.finish_analysis(report.clone())?;
    Ok(Some(report))
}

/// Mirrors analysis progress on `progress` until the run ends.
fn follow_analysis(handle: &AnalysisHandle, progress: &ProgressBar) -> Result<AnalysisReport> {
    loop {
        match handle.recv() {
            Some(AnalysisEvent::Progress(update)) => {
                progress.set_message(format!(
                    "Processing step {} of {}: {} (confidence {}%)",
                    update.current_step + 1,
                    update.steps.len(),
                    update.current().name,
                    update.metrics.confidence
                ));
            }
            Some(AnalysisEvent::Completed(report)) => return Ok(report),
            Some(AnalysisEvent::Cancelled) => bail!("Analysis was cancelled"),
            Some(AnalysisEvent::Failed(e)) => bail!("Analysis failed: {}", e),
            None => bail!("Analysis stopped without a report"),
        }
    }
}

fn new_spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Collects the selector's export for headless runs.
#[derive(Default)]
struct Collected {
    exported: Option<ExportedImage>,
}

impl SelectionHost for Collected {
    fn on_selection_complete(&mut self, image: ExportedImage) {
        self.exported = Some(image);
    }

    fn on_cancel(&mut self) {}
}

fn copy_to_clipboard(exported: &ExportedImage) {
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(exported.to_data_url()) {
                eprintln!("Warning: Failed to copy to clipboard: {}", e);
            } else {
                println!("(Copied to clipboard)");
            }
        }
        Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
    }
}

/// Prints the metrics and the results table as markdown.
fn print_report(report: &AnalysisReport) {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.italic.set_fg(Color::Magenta);

    let metrics = &report.metrics;
    let text = format!(
        "**Analysis complete**\n\nConfidence *{}%*, risk level *{}%*, processing speed *{}%*, accuracy *{}%*\n\n{}",
        metrics.confidence,
        metrics.risk_level,
        metrics.processing_speed,
        metrics.accuracy,
        report.to_markdown()
    );
    skin.print_text(&text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_crop_core::analysis::Metrics;

    #[test]
    fn parses_drag() {
        let drag: Drag = "100,100:90, 95.5".parse().unwrap();
        assert_eq!(drag, Drag { from: (100.0, 100.0), to: (90.0, 95.5) });
    }

    #[test]
    fn rejects_malformed_drag() {
        assert!("100,100".parse::<Drag>().is_err());
        assert!("a,1:2,3".parse::<Drag>().is_err());
        assert!("1;2:3,4".parse::<Drag>().is_err());
    }

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output(Path::new("/tmp/scans/passport.png")),
            PathBuf::from("/tmp/scans/passport-cropped.jpg")
        );
    }

    #[test]
    fn flags_override_config() {
        let args = SelectorArgs {
            image: PathBuf::from("x.png"),
            screen: Some("select".to_string()),
            theme: Some("flat".to_string()),
            resizable: true,
        };
        let selector = resolve_selector(&Config::default(), &args).unwrap();
        assert_eq!((selector.max_width, selector.max_height), (700.0, 500.0));
        assert_eq!(selector.theme, Theme::Flat);
        assert!(selector.resizable);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    fn fixture(name: &str, width: u32, height: u32) -> PathBuf {
        let frame = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 60, 90, 255]));
        let path = std::env::temp_dir().join(format!("doc-crop-{}-{}.png", name, std::process::id()));
        fs::write(&path, ImageProcessor::encode_png(&frame).unwrap()).unwrap();
        path
    }

    fn instant_schedule() -> AnalysisSchedule {
        AnalysisSchedule {
            upload_delay: Duration::ZERO,
            start_delay: Duration::from_millis(1),
            step_interval: Duration::from_millis(1),
            result_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn wizard_runs_from_upload_to_report() {
        let path = fixture("wizard", 100, 50);

        let report = run_wizard(
            &path,
            SelectorConfig::default(),
            instant_schedule(),
            vec![AnalysisOption::Metadata],
            false,
        )
        .await
        .unwrap()
        .expect("headless crop always completes");
        fs::remove_file(&path).ok();

        assert_eq!(report.options, vec![AnalysisOption::Metadata]);
        assert_eq!(report.metrics, Metrics::FINAL);
        assert_eq!(report.results.len(), 5);
    }

    #[tokio::test]
    async fn wizard_reports_missing_image() {
        let missing = std::env::temp_dir().join("doc-crop-does-not-exist.png");
        let result = run_wizard(
            &missing,
            SelectorConfig::default(),
            instant_schedule(),
            Vec::new(),
            false,
        )
        .await;
        assert!(result.is_err());
    }
}
