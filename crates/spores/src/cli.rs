use std::path::PathBuf;

use backdrop::AnchorSpec;
use clap::{Args, Parser, Subcommand};
use renderer::{ColorSpaceMode, GpuPowerPreference};

#[derive(Parser, Debug)]
#[command(
    name = "spores",
    author,
    version,
    about = "Animated shader background that reacts to the pointer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file to read instead of `spores.toml` in the config directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Background texture: an http(s) URL, a file:// URL, or a local path.
    #[arg(long, value_name = "URL|PATH", global = true)]
    pub texture: Option<String>,

    /// Fragment shader to use instead of the bundled one.
    #[arg(long, value_name = "FILE", global = true)]
    pub fragment: Option<PathBuf>,

    /// Vertex shader to use instead of the bundled one.
    #[arg(long, value_name = "FILE", global = true)]
    pub vertex: Option<PathBuf>,

    /// Window size in logical pixels when not fullscreen (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, global = true)]
    pub size: Option<[u32; 2]>,

    /// Open a regular window instead of a borderless fullscreen one.
    #[arg(long, global = true)]
    pub windowed: bool,

    /// Exclusion anchor: `px:X,Y,W,H` in logical pixels or `rel:CX,CY,W,H` as
    /// fractions of the viewport.
    #[arg(long, value_name = "SPEC", value_parser = parse_anchor, global = true)]
    pub anchor: Option<AnchorSpec>,

    /// GPU power preference: `low` or `high`.
    #[arg(long, value_name = "PREF", value_parser = parse_power, global = true)]
    pub power: Option<GpuPowerPreference>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space, global = true)]
    pub color_space: Option<ColorSpaceMode>,

    /// Request a transparent window with premultiplied alpha.
    #[arg(long, global = true)]
    pub transparent: bool,

    /// Start the animation clock at zero instead of a random offset.
    #[arg(long, global = true)]
    pub no_random_start: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print resolved config and cache directories.
    Where,
    /// Print the effective configuration as TOML.
    Config,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<[u32; 2], String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window size must be greater than zero".into());
    }
    Ok([width, height])
}

pub fn parse_anchor(value: &str) -> Result<AnchorSpec, String> {
    let trimmed = value.trim();
    let (kind, rest) = trimmed
        .split_once(':')
        .ok_or_else(|| "expected px:X,Y,W,H or rel:CX,CY,W,H".to_string())?;
    let numbers = rest
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid anchor component '{}'", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let &[a, b, width, height] = numbers.as_slice() else {
        return Err(format!(
            "anchor needs four components, got {}",
            numbers.len()
        ));
    };

    let spec = match kind.trim().to_ascii_lowercase().as_str() {
        "px" | "pixels" => AnchorSpec::Pixels {
            x: a,
            y: b,
            width,
            height,
        },
        "rel" | "relative" => AnchorSpec::Relative {
            center_x: a,
            center_y: b,
            width,
            height,
        },
        other => {
            return Err(format!(
                "unknown anchor kind '{other}'; expected px or rel"
            ))
        }
    };
    spec.validate().map_err(|err| err.to_string())
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!(
            "unknown power preference '{other}'; expected low or high"
        )),
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" | "srgb-off" | "webgl" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), [1280, 720]);
        assert_eq!(parse_size(" 800 X 600 ").unwrap(), [800, 600]);
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("800").is_err());
    }

    #[test]
    fn parses_anchor_variants() {
        assert_eq!(
            parse_anchor("px:100,50,640,360").unwrap(),
            AnchorSpec::Pixels {
                x: 100.0,
                y: 50.0,
                width: 640.0,
                height: 360.0,
            }
        );
        assert_eq!(
            parse_anchor("rel:0.5,0.4,0.3,0.2").unwrap(),
            AnchorSpec::Relative {
                center_x: 0.5,
                center_y: 0.4,
                width: 0.3,
                height: 0.2,
            }
        );
        assert!(parse_anchor("px:1,2,3").is_err());
        assert!(parse_anchor("px:0,0,0,10").is_err());
        assert!(parse_anchor("rel:1.5,0.5,0.2,0.2").is_err());
        assert!(parse_anchor("box:0,0,1,1").is_err());
    }

    #[test]
    fn parses_power_and_color_space() {
        assert_eq!(parse_power("HIGH").unwrap(), GpuPowerPreference::High);
        assert!(parse_power("turbo").is_err());
        assert_eq!(parse_color_space("srgb").unwrap(), ColorSpaceMode::Linear);
        assert!(parse_color_space("").is_err());
    }

    #[test]
    fn flags_are_accepted_before_and_after_subcommands() {
        let cli =
            Cli::try_parse_from(["spores", "--windowed", "config", "--size", "640x480"]).unwrap();
        assert!(cli.run.windowed);
        assert_eq!(cli.run.size, Some([640, 480]));
        assert!(matches!(cli.command, Some(Command::Config)));
    }
}
