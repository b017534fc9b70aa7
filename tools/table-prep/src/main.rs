//! table-prep: offline firing-table builder and table inspection tool.
//!
//! Usage:
//!   table-prep build --profile worlds/valley.json --output tables/
//!   table-prep inspect --table tables/valley.json
//!   table-prep query --table tables/valley.json --x 400 --y -50

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use ballista_core::constants::{DT, FIELD_HEIGHT, FIELD_WIDTH};
use ballista_core::profile::{FrameScaledProfile, WorldProfile};
use ballista_sim::builder::{BuilderConfig, TableBuilder};
use ballista_sim::physics::{ArenaConfig, ArenaPhysics};
use ballista_tables::format;

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        bail!("no command given");
    }

    match args[1].as_str() {
        "build" => cmd_build(&args[2..]),
        "inspect" => cmd_inspect(&args[2..]),
        "query" => cmd_query(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command: {other}")
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn print_usage() {
    eprintln!(
        "table-prep: firing-table preprocessing tool\n\
         \n\
         Commands:\n\
         \n\
         build     Sweep all 360 launch angles for a world and write its table\n\
         \n\
           --profile <path>   World profile JSON\n\
           --output <dir>     Directory for <world_id>.json\n\
           --width <px>       Field width (default: {FIELD_WIDTH})\n\
           --height <px>      Field height (default: {FIELD_HEIGHT})\n\
           --dt <secs>        Physics step (default: 1/60)\n\
           --frame-rate <fps> Profile holds per-frame values at this rate\n\
         \n\
         inspect   Print coverage statistics for a table file\n\
         \n\
           --table <path>     Table JSON file\n\
         \n\
         query     Print the launch angles stored for a point\n\
         \n\
           --table <path>     Table JSON file\n\
           --x <px> --y <px>  World point, snapped to the 10 px grid\n\
         \n\
         Logging: RUST_LOG sets the filter, LOG_FORMAT=json for JSON lines.\n"
    );
}

fn parse_flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].as_str())
}

fn parse_path(args: &[String], name: &str) -> Result<PathBuf> {
    parse_flag(args, name)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{name} <path> is required"))
}

fn parse_number(args: &[String], name: &str) -> Result<Option<f64>> {
    let Some(raw) = parse_flag(args, name) else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .with_context(|| format!("{name} expects a number, got '{raw}'"))?;
    if !value.is_finite() {
        bail!("{name} must be finite");
    }
    Ok(Some(value))
}

fn load_profile(path: &Path, frame_rate: Option<f64>) -> Result<WorldProfile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading profile {}", path.display()))?;
    let profile = match frame_rate {
        Some(fps) => {
            let frame: FrameScaledProfile = serde_json::from_str(&json)
                .with_context(|| format!("parsing frame-scaled profile {}", path.display()))?;
            let profile = WorldProfile::from_frame_scaled(&frame, fps);
            profile.validate()?;
            profile
        }
        None => WorldProfile::from_json(&json)
            .with_context(|| format!("parsing profile {}", path.display()))?,
    };
    Ok(profile)
}

// --- Build command ---

fn cmd_build(args: &[String]) -> Result<()> {
    let profile_path = parse_path(args, "--profile")?;
    let output = parse_path(args, "--output")?;
    let width = parse_number(args, "--width")?.unwrap_or(FIELD_WIDTH);
    let height = parse_number(args, "--height")?.unwrap_or(FIELD_HEIGHT);
    let dt = parse_number(args, "--dt")?.unwrap_or(DT);
    if width <= 0.0 || height <= 0.0 {
        bail!("field size must be positive, got {width}x{height}");
    }
    if dt <= 0.0 {
        bail!("--dt must be positive, got {dt}");
    }

    let world = load_profile(&profile_path, parse_number(args, "--frame-rate")?)?;
    info!(
        world = %world.id,
        gravity = world.gravity,
        drag = world.drag,
        speed = world.nominal_speed(),
        width,
        height,
        dt,
        "building firing table"
    );

    let mut arena = ArenaPhysics::new(ArenaConfig::for_profile(&world));
    let mut builder = TableBuilder::new(BuilderConfig {
        field_width: width,
        field_height: height,
        ..Default::default()
    });
    builder.start(&mut arena, &world);
    let report = builder
        .run_to_completion(&mut arena, dt)
        .ok_or_else(|| anyhow!("build for '{}' did not finish", world.id))?;

    let path = format::table_path(&output, &report.world_id)?;
    format::write(&report.table, &path)
        .with_context(|| format!("writing {}", path.display()))?;

    let stats = report.table.stats();
    println!("Wrote {}", path.display());
    println!(
        "  {} cells, {} entries, longest wait {:.2}s",
        stats.cells, stats.entries, report.longest_wait_secs
    );
    if !report.skipped_angles.is_empty() {
        println!("  skipped angles: {:?}", report.skipped_angles);
    }
    Ok(())
}

// --- Inspect command ---

fn cmd_inspect(args: &[String]) -> Result<()> {
    let path = parse_path(args, "--table")?;
    let table = format::load(&path).with_context(|| format!("loading {}", path.display()))?;
    let stats = table.stats();

    println!("{}", path.display());
    println!("  cells:               {}", stats.cells);
    println!("  entries:             {}", stats.entries);
    println!("  distinct angles:     {}", stats.distinct_angles);
    println!("  max angles per cell: {}", stats.max_angles_per_cell);
    match stats.bounds {
        Some((min, max)) => println!(
            "  bounds:              x {}..{}, y {}..{}",
            min.x, max.x, min.y, max.y
        ),
        None => println!("  bounds:              (empty table)"),
    }
    Ok(())
}

// --- Query command ---

fn cmd_query(args: &[String]) -> Result<()> {
    let path = parse_path(args, "--table")?;
    let x = parse_number(args, "--x")?.ok_or_else(|| anyhow!("--x <px> is required"))?;
    let y = parse_number(args, "--y")?.ok_or_else(|| anyhow!("--y <px> is required"))?;

    let table = format::load(&path).with_context(|| format!("loading {}", path.display()))?;
    let angles = table.lookup(x, y);
    if angles.is_empty() {
        println!("no angles reach ({x}, {y})");
        return Ok(());
    }
    for angle in angles {
        println!("{:>6.1}°  {angle:.6} rad", angle.to_degrees());
    }
    Ok(())
}
