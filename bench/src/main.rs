use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use pixmix::{
    ChainConfig, FilterKind, Fixed, Image, ImplementationChain, Kernel, Operator, PixelFormat,
    Transform, composite_with, create_separable_convolution,
};
use serde::Serialize;
use sha2::Digest as _;

/// Time scaled composites over a sweep of scale factors.
#[derive(Parser, Debug)]
#[command(name = "pixmix-bench", version)]
struct Args {
    /// Sampling filter: nearest, bilinear or separable convolution.
    #[arg(long, value_enum, default_value_t = FilterArg::B)]
    filter: FilterArg,

    /// First scale factor (destination pixels per source pixel).
    #[arg(long, default_value_t = 0.1)]
    start: f64,

    /// Last scale factor, inclusive.
    #[arg(long, default_value_t = 10.005)]
    end: f64,

    #[arg(long, default_value_t = 0.01)]
    step: f64,

    #[arg(long, default_value_t = 320)]
    dest_width: u32,

    #[arg(long, default_value_t = 240)]
    dest_height: u32,

    /// Timed runs per scale; the best one is reported.
    #[arg(long, default_value_t = 3)]
    test_repeats: u32,

    /// Operator name, e.g. `over`, `src`, `add`.
    #[arg(long, default_value = "over")]
    op: String,

    /// Backends to leave out of the chain (same syntax as PIXMIX_DISABLE).
    #[arg(long)]
    disable: Option<String>,

    /// Emit one JSON object per scale instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print a digest of each result, for comparing chains.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    /// Nearest neighbour.
    N,
    /// Bilinear.
    B,
    /// Separable convolution with box kernels.
    S,
}

#[derive(Debug, Serialize)]
struct Sample {
    scale: f64,
    best_ms: f64,
    ns_per_pixel: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.start <= 0.0 || args.end < args.start || args.step <= 0.0 {
        anyhow::bail!("--start must be > 0, --end >= --start and --step > 0");
    }
    if args.dest_width == 0 || args.dest_height == 0 {
        anyhow::bail!("--dest-width/--dest-height must be > 0");
    }
    if args.test_repeats == 0 {
        anyhow::bail!("--test-repeats must be >= 1");
    }
    let op: Operator = args
        .op
        .parse()
        .with_context(|| format!("parse --op value '{}'", args.op))?;

    let config = match &args.disable {
        Some(list) => ChainConfig::parse_list(list),
        None => ChainConfig::from_env(),
    };
    let chain = ImplementationChain::new(&config);

    let src_width = (f64::from(args.dest_width) / args.start).ceil() as u32 + 1;
    let src_height = (f64::from(args.dest_height) / args.start).ceil() as u32 + 1;
    let mut src = random_source(src_width, src_height)?;

    let stride = (args.dest_width as usize * 4).next_multiple_of(16);
    let mut dst = Image::new(PixelFormat::A8R8G8B8, args.dest_width, args.dest_height, None, stride)
        .context("allocate destination")?;
    let clear = Image::solid(0);

    eprintln!(
        "bench: {op} {filter:?}, source {src_width}x{src_height} -> {w}x{h}, chain [{chain}], {repeats} run(s) per scale ({profile} build)",
        op = op.name(),
        filter = args.filter,
        w = args.dest_width,
        h = args.dest_height,
        chain = chain
            .backends()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(" <- "),
        repeats = args.test_repeats,
        profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    );
    if !args.json {
        println!("{:>8} {:>12} {:>10}", "scale", "best", "ns/pixel");
    }

    let pixels = f64::from(args.dest_width) * f64::from(args.dest_height);
    let steps = ((args.end - args.start) / args.step).floor() as u32;
    for i in 0..=steps {
        let scale = args.start + f64::from(i) * args.step;
        let s = Fixed::from_f64(1.0 / scale + 0.5 / 65536.0);
        configure(&mut src, args.filter, s)?;

        let (w, h) = (args.dest_width, args.dest_height);
        composite_with(&chain, Operator::Clear, &clear, None, &mut dst, 0, 0, 0, 0, 0, 0, w, h)?;

        let mut best = Duration::MAX;
        for _ in 0..args.test_repeats {
            let t0 = Instant::now();
            composite_with(&chain, op, &src, None, &mut dst, 0, 0, 0, 0, 0, 0, w, h)?;
            best = best.min(t0.elapsed());
        }

        let digest = if args.verbose {
            let words = dst.data().context("destination has no pixels")?;
            Some(digest_hex(words))
        } else {
            None
        };
        let sample = Sample {
            scale,
            best_ms: best.as_secs_f64() * 1000.0,
            ns_per_pixel: best.as_secs_f64() * 1e9 / pixels,
            digest,
        };
        report(&sample, args.json)?;
    }
    Ok(())
}

fn configure(src: &mut Image<'_>, filter: FilterArg, s: Fixed) -> anyhow::Result<()> {
    src.set_transform(Some(Transform::scale(s, s)));
    match filter {
        FilterArg::N => src.set_filter(FilterKind::Nearest, &[])?,
        FilterArg::B => src.set_filter(FilterKind::Bilinear, &[])?,
        FilterArg::S => {
            let ks = kernel_scale(s);
            let params = create_separable_convolution(
                ks,
                ks,
                Kernel::Box,
                Kernel::Box,
                Kernel::Box,
                Kernel::Box,
                4,
                4,
            )
            .context("build separable kernel")?;
            src.set_filter(FilterKind::SeparableConvolution, &params)?;
        }
    }
    Ok(())
}

const MAX_KERNEL_SCALE: i32 = 16;

/// Separable kernels stretch with the scale, up to 16 source pixels.
fn kernel_scale(s: Fixed) -> Fixed {
    s.min(Fixed::from_int(MAX_KERNEL_SCALE))
}

fn random_source(w: u32, h: u32) -> anyhow::Result<Image<'static>> {
    let mut img = Image::new(PixelFormat::A8R8G8B8, w, h, None, 0).context("allocate source")?;
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    let words = img.data_mut()?;
    for word in words.iter_mut() {
        state = mix64(state);
        let a = (state >> 56) as u32;
        *word = (a << 24) | (state as u32 & 0x00ff_ffff & (a * 0x0001_0101));
    }
    Ok(img)
}

fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_hex(words: &[u32]) -> String {
    let mut hasher = sha2::Sha256::new();
    for w in words {
        hasher.update(w.to_le_bytes());
    }
    hasher.finalize()[..8]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn report(sample: &Sample, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(sample)?);
        return Ok(());
    }
    print!(
        "{:>8.3} {:>10.3}ms {:>10.3}",
        sample.scale, sample.best_ms, sample.ns_per_pixel
    );
    match &sample.digest {
        Some(d) => println!("  {d}"),
        None => println!(),
    }
    Ok(())
}
