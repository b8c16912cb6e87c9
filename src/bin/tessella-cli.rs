use std::ops::ControlFlow;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;

use tessella::{draw_with, Color, Palette, PaletteDb, Params, Phase, RenderEvent, Style};

#[derive(Parser)]
struct Opts {
    /// Seed for the deterministic render.
    #[clap(required_unless_present_any = ["params_json", "list"])]
    seed: Option<u64>,
    /// Style as "family:variant", e.g. "tile:truchet" or "flow:curl".
    #[clap(short, long, default_value = "tile:quarterCircles")]
    style: String,
    /// Named palette from the bundled set.
    #[clap(short, long, default_value = "ember", conflicts_with = "colors")]
    palette: String,
    /// Explicit palette as comma-separated hex colors, e.g. "#e53935,#1e88e5".
    #[clap(long, value_delimiter = ',')]
    colors: Vec<String>,
    /// Background color; only used together with --colors.
    #[clap(long, default_value = "#f5f5dc")]
    background: String,
    #[clap(short, default_value = "800")]
    width: i32,
    #[clap(long, default_value = "800")]
    height: i32,
    /// Cells along the longer canvas side.
    #[clap(short, long, default_value = "12")]
    grid_density: u32,
    /// Detail knob in [0, 1].
    #[clap(short, long, default_value = "0.6")]
    complexity: f64,
    /// Load the full generation request from a JSON file instead of the
    /// individual flags above.
    #[clap(long, conflicts_with_all = ["palette", "colors"])]
    params_json: Option<PathBuf>,
    /// Output file; defaults to "<seed>-<family>-<variant>.png".
    #[clap(short, long)]
    out: Option<PathBuf>,
    /// List every available style and palette, then exit.
    #[clap(long)]
    list: bool,
    /// Print phase progress while rendering.
    #[clap(long)]
    progress: bool,
}

fn resolve_palette(opts: &Opts, db: &PaletteDb) -> anyhow::Result<Palette> {
    if opts.colors.is_empty() {
        return db
            .get(&opts.palette)
            .cloned()
            .with_context(|| format!("unknown palette {:?}", opts.palette));
    }
    let colors = opts
        .colors
        .iter()
        .map(|s| Color::from_str(s).with_context(|| format!("bad color {s:?}")))
        .collect::<anyhow::Result<Vec<Color>>>()?;
    let background = Color::from_str(&opts.background)
        .with_context(|| format!("bad background {:?}", opts.background))?;
    Ok(Palette::new(colors, background))
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    let db = PaletteDb::from_bundle();

    if opts.list {
        println!("styles:");
        for style in Style::all() {
            println!("  {style}");
        }
        println!("palettes:");
        for name in db.names() {
            println!("  {name}");
        }
        return Ok(());
    }

    let params = match &opts.params_json {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut params: Params = serde_json::from_str(&json)
                .with_context(|| format!("parsing {}", path.display()))?;
            if let Some(seed) = opts.seed {
                params.seed = seed;
            }
            params
        }
        None => Params {
            seed: opts.seed.expect("clap requires a seed here"),
            palette: resolve_palette(&opts, &db)?,
            width: opts.width,
            height: opts.height,
            grid_density: opts.grid_density,
            style: Style::from_str(&opts.style)?,
            complexity: opts.complexity,
        },
    };

    let mut last_phase: Option<Phase> = None;
    let mut on_event = |event: RenderEvent| {
        if opts.progress && (last_phase != Some(event.phase) || event.completed == event.total) {
            last_phase = Some(event.phase);
            eprintln!(
                "{:?}: {}/{}",
                event.phase, event.completed, event.total
            );
        }
        ControlFlow::Continue(())
    };
    let dt = draw_with(&params, &mut on_event)?;

    let filename = opts.out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}-{}-{}.png",
            params.seed,
            params.style.family(),
            params.style.variant_name()
        ))
    });
    dt.write_png(&filename)
        .with_context(|| format!("writing {}", filename.display()))?;
    eprintln!("wrote png: {}", filename.display());
    Ok(())
}
