use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;

#[derive(Parser, Debug)]
#[command(name = "tokenforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a token from a JSON job file.
    Compose(ComposeArgs),
    /// Split an overlay into its mask and overlay passes.
    Split(SplitArgs),
    /// Scan an overlay library and print its tree.
    Library(LibraryArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Job JSON.
    #[arg(long)]
    job: PathBuf,

    /// Output image; format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Print the SHA-256 of the written file.
    #[arg(long)]
    digest: bool,
}

#[derive(Parser, Debug)]
struct SplitArgs {
    /// Overlay source (psd, png, gif, jpg, bmp).
    #[arg(long)]
    overlay: PathBuf,

    /// Where to write the mask pass.
    #[arg(long)]
    mask_out: PathBuf,

    /// Where to write the overlay pass.
    #[arg(long)]
    overlay_out: PathBuf,

    /// Legacy colour-key tolerance.
    #[arg(long, default_value_t = tokenforge::DEFAULT_MAGENTA_THRESHOLD)]
    magenta_threshold: u8,
}

#[derive(Parser, Debug)]
struct LibraryArgs {
    /// Library root.
    #[arg(long)]
    dir: PathBuf,

    /// Decode threads (default: one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Thumbnail width in pixels.
    #[arg(long, default_value_t = tokenforge::DEFAULT_THUMB_SIZE)]
    thumb_size: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Split(args) => cmd_split(args),
        Command::Library(args) => cmd_library(args),
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let job = tokenforge::TokenJob::load(&args.job)
        .with_context(|| format!("load job '{}'", args.job.display()))?;
    let token = job.render().context("compose token")?;
    if token.composite.is_empty() {
        tracing::warn!("composite is empty");
    }
    token.export(&args.out).context("write token")?;

    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        token.composite.image.width(),
        token.composite.image.height()
    );
    if args.digest {
        let bytes =
            std::fs::read(&args.out).with_context(|| format!("read '{}'", args.out.display()))?;
        println!("{}", sha256_hex(&bytes));
    }
    Ok(())
}

fn cmd_split(args: SplitArgs) -> anyhow::Result<()> {
    let opts = tokenforge::DecodeOptions {
        magenta_threshold: args.magenta_threshold,
        ..tokenforge::DecodeOptions::default()
    };
    let asset = tokenforge::decode_overlay(&args.overlay, &opts)?;
    write_png(&asset.mask, &args.mask_out)?;
    write_png(&asset.overlay, &args.overlay_out)?;
    eprintln!(
        "split {} ({}x{})",
        args.overlay.display(),
        asset.canvas_width,
        asset.canvas_height
    );
    Ok(())
}

fn cmd_library(args: LibraryArgs) -> anyhow::Result<()> {
    let opts = tokenforge::ScanOptions {
        thumb_size: args.thumb_size,
        threads: args.threads,
        ..tokenforge::ScanOptions::default()
    };
    let report =
        tokenforge::scan_overlay_library(&args.dir, &opts, &tokenforge::CancelToken::new())?;
    print_tree(&report.tree, &args.dir, 0);
    eprintln!(
        "{} loaded, {} skipped, {} found",
        report.counts.loaded, report.counts.skipped, report.counts.total
    );
    Ok(())
}

fn print_tree(node: &tokenforge::OverlayTree, root: &Path, depth: usize) {
    let indent = "  ".repeat(depth);
    for dir in &node.dirs {
        let name = dir.path.strip_prefix(root).unwrap_or(&dir.path);
        println!("{indent}{}/", name.display());
        print_tree(dir, &dir.path, depth + 1);
    }
    for entry in &node.overlays {
        let name = entry.path.strip_prefix(root).unwrap_or(&entry.path);
        println!(
            "{indent}{} [{}x{}]",
            name.display(),
            entry.thumbnail.width(),
            entry.thumbnail.height()
        );
    }
}

fn write_png(raster: &tokenforge::RasterImage, path: &Path) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        raster.as_bytes(),
        raster.width(),
        raster.height(),
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
