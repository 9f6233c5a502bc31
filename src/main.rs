use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use paritymark::constants::{
    DEFAULT_ANGLE_DEGREES, DEFAULT_COLOR, DEFAULT_FONT_SIZE, DEFAULT_H_SPACE, DEFAULT_OPACITY,
    DEFAULT_V_SPACE,
};
use paritymark::logging::{init_subscriber, LogFormat};
use paritymark::watermark::{
    to_data_url, write_png, Channel, ImageFetcher, ImageFetcherConfig, ImagePosition,
    ImageWatermarkConfig, TextPosition, TextWatermarkConfig, WatermarkDefinition, WatermarkJob,
    WatermarkProcessor,
};
use std::path::PathBuf;

/// Paritymark - hide markers in the low bit of an image channel, or draw
/// visible text and logo watermarks
#[derive(Parser, Debug)]
#[command(name = "paritymark")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Log filter directives (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide marker text in an image
    Embed {
        /// Image to mark (file path or https URL)
        #[arg(short, long)]
        input: String,
        /// PNG output path
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        text: TextArgs,
        /// Channel carrying the hidden bits
        #[arg(long, default_value = "r")]
        channel: Channel,
    },
    /// Recover a hidden marker as a black and white image
    Reveal {
        /// Marked image (file path or https URL)
        #[arg(short, long)]
        input: String,
        /// PNG output path; prints a data URL when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Channel carrying the hidden bits
        #[arg(long, default_value = "r")]
        channel: Channel,
    },
    /// Draw a visible text or image watermark
    Overlay {
        /// Image to mark (file path or https URL)
        #[arg(short, long)]
        input: String,
        /// PNG output path
        #[arg(short, long)]
        output: PathBuf,
        /// Secondary image to draw instead of text
        #[arg(long, conflicts_with = "text")]
        image: Option<String>,
        /// Placement for --image
        #[arg(long, default_value = "bottom-right")]
        image_position: ImagePosition,
        /// Resize width for --image
        #[arg(long)]
        width: Option<u32>,
        /// Resize height for --image
        #[arg(long)]
        height: Option<u32>,
        /// Opacity from 0.0 to 1.0
        #[arg(long, default_value_t = DEFAULT_OPACITY)]
        opacity: f32,
        #[command(flatten)]
        text: OptionalTextArgs,
    },
    /// Run a YAML job file
    Run {
        /// Path to job file
        #[arg(short, long, default_value = "watermark.yaml")]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TextArgs {
    /// Marker text
    #[arg(long)]
    text: String,
    #[command(flatten)]
    style: TextStyleArgs,
}

#[derive(Args, Debug)]
struct OptionalTextArgs {
    /// Marker text
    #[arg(long)]
    text: Option<String>,
    #[command(flatten)]
    style: TextStyleArgs,
}

#[derive(Args, Debug)]
struct TextStyleArgs {
    /// Font size in pixels
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: f32,
    /// Text color as hex
    #[arg(long, default_value = DEFAULT_COLOR)]
    color: String,
    /// Text placement
    #[arg(long, default_value = "diagonal")]
    position: TextPosition,
    /// Horizontal margin or tile gap
    #[arg(long, default_value_t = DEFAULT_H_SPACE)]
    c_space: f32,
    /// Vertical margin or tile gap
    #[arg(long, default_value_t = DEFAULT_V_SPACE)]
    v_space: f32,
    /// Diagonal rotation in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE_DEGREES, allow_hyphen_values = true)]
    angle: f32,
    /// TrueType/OpenType font file
    #[arg(long)]
    font: Option<PathBuf>,
}

impl TextStyleArgs {
    fn into_config(self, text: String) -> TextWatermarkConfig {
        TextWatermarkConfig {
            font_size: self.font_size,
            color: self.color,
            position: self.position,
            c_space: self.c_space,
            v_space: self.v_space,
            angle: self.angle,
            font: self.font,
            ..TextWatermarkConfig::new(text)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging subsystem
    init_subscriber(cli.log_format, cli.log_filter.as_deref())
        .context("Failed to initialize logging subsystem")?;

    let fetcher = ImageFetcher::new(ImageFetcherConfig::default())?;
    let processor = WatermarkProcessor::new(fetcher);

    match cli.command {
        Command::Embed {
            input,
            output,
            text,
            channel,
        } => {
            let config = TextWatermarkConfig {
                secret: true,
                channel,
                ..text.style.into_config(text.text)
            };
            let job = WatermarkJob {
                target: input,
                output,
                watermark: WatermarkDefinition::Text(config),
            };
            processor.run(&job).await?;
        }
        Command::Reveal {
            input,
            output,
            channel,
        } => {
            let revealed = processor.reveal(&input, channel).await?;
            match output {
                Some(path) => write_png(&revealed, &path)?,
                None => println!("{}", to_data_url(&revealed)?),
            }
        }
        Command::Overlay {
            input,
            output,
            image,
            image_position,
            width,
            height,
            opacity,
            text,
        } => {
            let watermark = match (image, text.text) {
                (Some(source), _) => WatermarkDefinition::Image(ImageWatermarkConfig {
                    source,
                    width,
                    height,
                    opacity,
                    position: image_position,
                }),
                (None, Some(marker)) => WatermarkDefinition::Text(TextWatermarkConfig {
                    opacity,
                    ..text.style.into_config(marker)
                }),
                (None, None) => bail!("overlay needs either --text or --image"),
            };
            let job = WatermarkJob {
                target: input,
                output,
                watermark,
            };
            processor.run(&job).await?;
        }
        Command::Run { config } => {
            let job = WatermarkJob::from_file(&config)
                .with_context(|| format!("Failed to load job {}", config.display()))?;

            tracing::info!(
                config_file = %config.display(),
                target = %job.target,
                output = %job.output.display(),
                "Job loaded successfully"
            );

            processor.run(&job).await?;
        }
    }

    Ok(())
}
