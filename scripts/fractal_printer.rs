use std::time::Instant;

use clap::Parser;
use fractal_printer::{
    Error, Result,
    config::SolidConfig,
    extract::{IsoSurfaceExtractor, VoxelFaceExtractor},
    json::{merge_json, parse_object},
    stl::export_stl,
    utils::{progress_bar, progress_callback, progress_len},
    voxelizer::{voxelize_dense_with_progress, voxelize_with_progress},
};
use log::{info, warn};
use tinyjson::JsonValue;

/// Generate a printable STL solid from a distance function
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    input: String,

    /// inline json, merged over the configuration file
    #[arg(short = 'A', long)]
    additional_inline: Option<String>,

    /// STL output
    #[arg(short, long, default_value = "output.stl")]
    output: String,

    /// Override the number of subdivision levels
    #[arg(long)]
    levels: Option<u32>,

    /// Override the edge length of the sampled cube
    #[arg(long)]
    size: Option<f64>,

    /// Evaluate every voxel instead of pruning blocks
    #[arg(long)]
    dense: bool,

    /// Log ouput
    #[arg(short, long)]
    log: Option<String>,

    /// Number of threads (0 = all cores, -N = all cores - N, N = number of threads)
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    threads: i32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(log_out) = &args.log {
        let target = Box::new(std::fs::File::create(log_out)?);
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .target(env_logger::Target::Pipe(target))
            .init();
    } else {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    // Set number of threads
    if args.threads != 0 {
        let nbthreads = if args.threads < 0 {
            #[allow(clippy::cast_possible_wrap)]
            (num_cpus::get() as i32 + args.threads).max(1)
        } else {
            args.threads
        };
        info!("Number threads set at : {nbthreads}");
        rayon::ThreadPoolBuilder::new()
            .num_threads(nbthreads as usize)
            .build_global()
            .map_err(|err| Error::Other(Box::new(err)))?;
    }

    // 1) Load configuration and apply patches
    let start = Instant::now();
    let contents = std::fs::read_to_string(&args.input)?;
    let mut json = parse_object(&contents)?;
    if let Some(add) = &args.additional_inline {
        merge_json(&mut json, &parse_object(add)?)?;
    }
    if let Some(levels) = args.levels {
        json.insert("levels".to_string(), JsonValue::Number(f64::from(levels)));
    }
    if let Some(size) = args.size {
        json.insert("size".to_string(), JsonValue::Number(size));
    }
    if args.dense {
        json.insert("dense".to_string(), JsonValue::Boolean(true));
    }
    let config = SolidConfig::from_json(&json)?;
    info!("Load configuration time: {:?}", start.elapsed());

    // 2) Voxelization
    let start = Instant::now();
    let progress = progress_bar(progress_len(&config.voxelizer, config.dense))?;
    let voxels = {
        let mut callback = progress_callback(&progress);
        if config.dense {
            voxelize_dense_with_progress(config.field.as_ref(), &config.voxelizer, &mut callback)?
        } else {
            voxelize_with_progress(config.field.as_ref(), &config.voxelizer, &mut callback)?
        }
    };
    progress.finish_and_clear();
    info!(
        "Voxelization time: {:?} ({} evaluations)",
        start.elapsed(),
        voxels.evaluations()
    );
    if voxels.mask.count_solid() == 0 {
        warn!("No solid voxel, the output will be empty");
    }

    // 3) Surface and export
    let start = Instant::now();
    let mesh = VoxelFaceExtractor.extract(&voxels.mask);
    if !mesh.is_closed() {
        warn!("Extracted surface is not closed");
    }
    let bounds = mesh.bounds();
    info!(
        "Mesh centered at {:?}, extent {:?}",
        bounds.center(),
        bounds.diagonal()
    );
    export_stl(
        &args.output,
        &mesh.vertices,
        &mesh.faces,
        config.header.as_deref(),
    )?;
    info!("Surface and export time: {:?}", start.elapsed());

    Ok(())
}
