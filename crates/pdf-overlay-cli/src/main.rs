//! PDF Overlay CLI - manage translation projects and render overlay frames.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_overlay_core::{
    AppConfig, BackendKind, BatchEdit, ExportOutcome, FrameInput, Lang, NewProject, NormPoint,
    OverlayFont, OverlayRenderer, PdfExporter, Project, ProjectSession, ProjectStore,
    RasterCanvas, Selection, SelectionController, SelectionMode, TextColor, TranslationPass,
    create_translator, pdf::decode_page_image, util::parse_page_list,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[derive(Debug, Clone, ValueEnum)]
enum ColorOption {
    DarkRed,
    Black,
    Blue,
}

impl From<ColorOption> for TextColor {
    fn from(opt: ColorOption) -> Self {
        match opt {
            ColorOption::DarkRed => Self::dark_red(),
            ColorOption::Black => Self::black(),
            ColorOption::Blue => Self::blue(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendOption {
    Free,
    Openai,
}

impl From<BackendOption> for BackendKind {
    fn from(opt: BackendOption) -> Self {
        match opt {
            BackendOption::Free => Self::Free,
            BackendOption::Openai => Self::OpenAi,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeOption {
    Single,
    Area,
    Points,
}

impl From<ModeOption> for SelectionMode {
    fn from(opt: ModeOption) -> Self {
        match opt {
            ModeOption::Single => Self::Single,
            ModeOption::Area => Self::Area,
            ModeOption::Points => Self::Points,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdf-overlay")]
#[command(author, version, about = "Translated text overlays for PDF documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Project store directory
    #[arg(long, env = "PDF_OVERLAY_STORE", global = true)]
    store: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project from a PDF file
    New {
        pdf: PathBuf,

        /// Project name (default: file name without extension)
        #[arg(long, default_value = "")]
        name: String,

        /// Source language code
        #[arg(short = 's', long)]
        source: Option<String>,

        /// Target language code
        #[arg(short = 't', long)]
        target: Option<String>,
    },

    /// List projects, newest first
    List,

    /// Delete a project with its PDF and every translated page
    Delete { project: String },

    /// Translate a range of pages
    Translate {
        project: String,

        /// First page (default: 1)
        #[arg(long, default_value_t = 1)]
        from: u32,

        /// Last page (default: last page of the document)
        #[arg(long)]
        to: Option<u32>,

        /// Translation backend
        #[arg(long, value_enum)]
        backend: Option<BackendOption>,

        /// OpenAI API base URL
        #[arg(long, env = "OPENAI_API_BASE")]
        api_base: Option<String>,

        /// OpenAI API key
        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        /// Model name for OpenAI-compatible API
        #[arg(long, env = "OPENAI_MODEL")]
        model: Option<String>,
    },

    /// Show translated pages and the next untranslated one
    Pages { project: String },

    /// Render one overlay frame to PNG
    Render {
        project: String,
        page: u32,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Show the page without overlay text
        #[arg(long)]
        original: bool,

        /// Draw segment outlines and the selection
        #[arg(long)]
        edit: bool,

        /// Selected segment indices (e.g. "0,2"); defaults to the saved selection
        #[arg(long)]
        select: Option<String>,

        /// Canvas width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Translation text color
        #[arg(long, value_enum)]
        color: Option<ColorOption>,
    },

    /// Apply a selection gesture and save the resulting selection
    Select {
        project: String,
        page: u32,

        #[arg(long, value_enum, default_value = "single")]
        mode: ModeOption,

        /// Pointer position as normalized "x,y"; repeat for two-point gestures
        #[arg(long = "at", value_parser = parse_point, required = true)]
        at: Vec<NormPoint>,

        /// Start from an empty selection
        #[arg(long)]
        clear: bool,
    },

    /// Edit translated text of one segment
    Edit {
        project: String,
        page: u32,

        /// Segment index to change
        #[arg(long, requires = "text", conflicts_with = "revert")]
        index: Option<usize>,

        /// New text
        #[arg(long)]
        text: Option<String>,

        /// Restore the original text of this segment
        #[arg(long)]
        revert: Option<usize>,
    },

    /// Export translated pages as a PDF
    Export {
        project: String,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Pages to export (e.g., "1-5" or "1,3,5"); default: all translated
        #[arg(long)]
        pages: Option<String>,
    },
}

fn parse_point(s: &str) -> Result<NormPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("invalid x in '{s}'"))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("invalid y in '{s}'"))?;
    Ok(NormPoint::new(x, y))
}

fn parse_indices(s: &str) -> Result<BTreeSet<usize>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse().with_context(|| format!("Invalid segment index '{p}'")))
        .collect()
}

/// Accept a full project id or a unique prefix of one.
fn resolve_project(store: &ProjectStore, reference: &str) -> Result<Project> {
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(store.require_project(id)?);
    }

    let mut matches: Vec<Project> = store
        .list_projects()?
        .into_iter()
        .filter(|p| p.id.to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => bail!("No project matches '{reference}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("'{reference}' matches {n} projects; use a longer prefix"),
    }
}

fn selection_key(id: Uuid) -> String {
    format!("selection/{id}")
}

fn load_font(config: &AppConfig) -> Result<OverlayFont> {
    OverlayFont::load(config.overlay.font_path.as_deref())
        .context("No usable font; set overlay.font_path in the config file")
}

fn open_store(args: &Args, config: &AppConfig) -> Result<ProjectStore> {
    let path = args
        .store
        .clone()
        .unwrap_or_else(|| config.store.resolved_path());
    ProjectStore::open(&path).with_context(|| format!("Failed to open store {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    let store = open_store(&args, &config)?;

    match args.command {
        Command::New {
            pdf,
            name,
            source,
            target,
        } => cmd_new(&store, &config, &pdf, name, source, target),
        Command::List => cmd_list(&store),
        Command::Delete { project } => cmd_delete(&store, &project),
        Command::Translate {
            project,
            from,
            to,
            backend,
            api_base,
            api_key,
            model,
        } => {
            let mut config = config;
            if let Some(backend) = backend {
                config.translator.backend = backend.into();
            }
            if let Some(api_base) = api_base {
                config.translator.api_base = api_base;
            }
            if api_key.is_some() {
                config.translator.api_key = api_key;
            }
            if let Some(model) = model {
                config.translator.model = model;
            }
            cmd_translate(&store, &config, &project, from, to).await
        }
        Command::Pages { project } => cmd_pages(&store, &project),
        Command::Render {
            project,
            page,
            output,
            original,
            edit,
            select,
            width,
            color,
        } => {
            let mut config = config;
            if let Some(color) = color {
                config.text_color = color.into();
            }
            let options = RenderOptions {
                original,
                edit,
                select,
                width,
            };
            cmd_render(&store, &config, &project, page, &output, &options)
        }
        Command::Select {
            project,
            page,
            mode,
            at,
            clear,
        } => cmd_select(&store, &config, &project, page, mode.into(), &at, clear),
        Command::Edit {
            project,
            page,
            index,
            text,
            revert,
        } => cmd_edit(&store, &project, page, index.zip(text), revert),
        Command::Export {
            project,
            output,
            pages,
        } => cmd_export(&store, &config, &project, &output, pages.as_deref()),
    }
}

// CLI output is intentional
#[allow(clippy::print_stdout)]
fn cmd_new(
    store: &ProjectStore,
    config: &AppConfig,
    pdf: &Path,
    name: String,
    source: Option<String>,
    target: Option<String>,
) -> Result<()> {
    info!("Loading PDF: {}", pdf.display());
    let bytes =
        std::fs::read(pdf).with_context(|| format!("Failed to read PDF: {}", pdf.display()))?;
    let file_name = pdf
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document.pdf")
        .to_string();

    let new = NewProject::from_pdf(
        name,
        file_name,
        bytes,
        source.map_or_else(|| config.source_lang.clone(), Lang::new),
        target.map_or_else(|| config.target_lang.clone(), Lang::new),
    )
    .with_context(|| format!("Failed to load PDF: {}", pdf.display()))?;

    let project = store.create_project(new)?;
    println!(
        "Created project {} ({}, {} pages)",
        project.id, project.name, project.page_count
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
fn cmd_list(store: &ProjectStore) -> Result<()> {
    let projects = store.list_projects()?;
    if projects.is_empty() {
        println!("No projects");
        return Ok(());
    }

    for project in projects {
        let translated = store.pages_for_project(project.id)?.len();
        println!(
            "{}  {:<30} {:>4}/{:<4} pages  {} -> {}",
            project.id,
            project.name,
            translated,
            project.page_count,
            project.source_lang,
            project.target_lang
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn cmd_delete(store: &ProjectStore, reference: &str) -> Result<()> {
    let project = resolve_project(store, reference)?;
    store.delete_project(project.id)?;
    store.delete_setting(&selection_key(project.id))?;
    println!("Deleted project {} ({})", project.id, project.name);
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn cmd_translate(
    store: &ProjectStore,
    config: &AppConfig,
    reference: &str,
    from: u32,
    to: Option<u32>,
) -> Result<()> {
    let project = resolve_project(store, reference)?;
    let last = to.unwrap_or(project.page_count);

    let translator =
        create_translator(&config.translator).context("Failed to initialize translator")?;
    let pass = TranslationPass::from_config(store.clone(), translator, config);

    let total = last.min(project.page_count).saturating_sub(from.max(1)) + 1;
    let pb = ProgressBar::new(u64::from(total));
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let bar = pb.clone();
    let report = pass
        .run(
            project.id,
            from..=last,
            Some(Box::new(move |progress| {
                bar.set_message(format!("page {}", progress.page));
                bar.set_position(u64::from(progress.done));
            })),
        )
        .await;

    match report {
        Ok(report) => {
            pb.finish_with_message("done");
            if let Some(message) = report.message {
                println!("{message}");
            } else {
                println!("Translated pages {:?}", report.completed);
            }
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(e).context("Translation pass failed")
        }
    }
}

#[allow(clippy::print_stdout)]
fn cmd_pages(store: &ProjectStore, reference: &str) -> Result<()> {
    let project = resolve_project(store, reference)?;
    let session = ProjectSession::load(store.clone(), project.id)?;

    let translated = session.translated_page_numbers();
    println!(
        "{}: {}/{} pages translated",
        project.name,
        translated.len(),
        project.page_count
    );
    for page in session.pages() {
        let edited = page.segments.iter().filter(|s| s.is_translated()).count();
        println!(
            "  page {:>4}  {:>4} segments  {:>4} translated{}",
            page.page_number,
            page.segments.len(),
            edited,
            if page.is_available() { "" } else { "  (no image)" }
        );
    }
    match session.first_untranslated(0) {
        Some(next) => println!("Next untranslated page: {next}"),
        None => println!("All pages translated"),
    }
    Ok(())
}

struct RenderOptions {
    original: bool,
    edit: bool,
    select: Option<String>,
    width: Option<u32>,
}

#[allow(clippy::print_stdout)]
fn cmd_render(
    store: &ProjectStore,
    config: &AppConfig,
    reference: &str,
    page_number: u32,
    output: &Path,
    options: &RenderOptions,
) -> Result<()> {
    let project = resolve_project(store, reference)?;
    let page = store
        .get_page(project.id, page_number)?
        .with_context(|| format!("Page {page_number} is not translated yet"))?;

    let selected = match &options.select {
        Some(list) => parse_indices(list)?,
        None => store
            .get_setting::<Selection>(&selection_key(project.id))?
            .unwrap_or_default()
            .indices_for(page_number),
    };

    let image = decode_page_image(&page.image_data)?;
    let mut renderer = OverlayRenderer::new(&config.overlay, config.text_color);
    if let Some(width) = options.width {
        renderer = renderer.with_width(width);
    }

    let mut canvas = RasterCanvas::new(load_font(config)?)?;
    let layout = renderer.render(
        &mut canvas,
        &FrameInput {
            image: image.as_ref(),
            segments: &page.segments,
            show_original: options.original,
            edit_mode: options.edit,
            selected: &selected,
            gesture: None,
        },
    );

    std::fs::write(output, canvas.encode_png()?)
        .with_context(|| format!("Failed to write output: {}", output.display()))?;
    println!(
        "Rendered page {} at {}x{} to {}",
        page_number,
        layout.width,
        layout.height,
        output.display()
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
fn cmd_select(
    store: &ProjectStore,
    config: &AppConfig,
    reference: &str,
    page_number: u32,
    mode: SelectionMode,
    points: &[NormPoint],
    clear: bool,
) -> Result<()> {
    let project = resolve_project(store, reference)?;
    let page = store
        .get_page(project.id, page_number)?
        .with_context(|| format!("Page {page_number} is not translated yet"))?;

    let key = selection_key(project.id);
    let mut selection: Selection = if clear {
        Selection::default()
    } else {
        store.get_setting(&key)?.unwrap_or_default()
    };
    selection.activate_page(page_number);

    let mut controller = SelectionController::new(config.selection);
    controller.set_mode(mode);

    let mut steps = points.iter().copied();
    while let Some(point) = steps.next() {
        // An area drag uses the first point as press and the next as release
        if mode == SelectionMode::Area
            && let Some(end) = steps.next()
        {
            controller.pointer_down(page_number, point);
            let current = selection.indices_for(page_number);
            if let Some(update) = controller.pointer_up(page_number, end, &page.segments, &current) {
                selection.apply(update);
            }
            continue;
        }

        let current = selection.indices_for(page_number);
        if let Some(update) = controller.pointer_up(page_number, point, &page.segments, &current) {
            selection.apply(update);
        }
    }

    store.put_setting(&key, &selection)?;

    let indices: Vec<usize> = selection.indices().iter().copied().collect();
    println!("Page {page_number}: selected {indices:?}");
    for index in &indices {
        if let Some(segment) = page.segments.get(*index) {
            println!("  [{index}] {}", segment.text);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn cmd_edit(
    store: &ProjectStore,
    reference: &str,
    page_number: u32,
    change: Option<(usize, String)>,
    revert: Option<usize>,
) -> Result<()> {
    let project = resolve_project(store, reference)?;
    let mut session = ProjectSession::load(store.clone(), project.id)?;
    let mut page = session
        .page(page_number)
        .cloned()
        .with_context(|| format!("Page {page_number} is not translated yet"))?;

    let Some(index) = change.as_ref().map(|(i, _)| *i).or(revert) else {
        bail!("Nothing to do: pass --index with --text, or --revert");
    };
    if index >= page.segments.len() {
        bail!(
            "Segment {index} does not exist (page has {})",
            page.segments.len()
        );
    }

    let mut batch = BatchEdit::begin(&page, &BTreeSet::from([index]));
    match change {
        Some((_, text)) => {
            batch.set_text(index, text);
        }
        None => {
            batch.revert(index);
        }
    }

    let changed = batch.commit(&mut page);
    if changed == 0 {
        println!("Segment {index} unchanged");
        return Ok(());
    }
    session.save_page_segments(page_number, page.segments)?;
    println!("Saved segment {index} of page {page_number}");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn cmd_export(
    store: &ProjectStore,
    config: &AppConfig,
    reference: &str,
    output: &Path,
    pages: Option<&str>,
) -> Result<()> {
    let project = resolve_project(store, reference)?;
    let session = ProjectSession::load(store.clone(), project.id)?;

    let page_numbers = match pages {
        Some(spec) => {
            let pages = parse_page_list(spec, project.page_count).map_err(anyhow::Error::msg)?;
            if pages.is_empty() {
                bail!("No valid pages in '{spec}'");
            }
            pages
        }
        None => Vec::new(),
    };

    let exporter = PdfExporter::from_config(config, load_font(config)?);
    match exporter.export(&session, &page_numbers)? {
        ExportOutcome::Exported { pdf, pages } => {
            std::fs::write(output, pdf)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;
            println!(
                "Exported {} page(s) to {}",
                pages.len(),
                output.display()
            );
        }
        ExportOutcome::NothingToExport { reason } => println!("{reason}"),
    }
    Ok(())
}
