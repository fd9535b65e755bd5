use std::path::PathBuf;

use clap::{Parser, Subcommand};
use subgrab::{ArtifactRegistry, DownloadOptions, Downloader, Language, WhisperModel};

#[derive(Parser)]
#[command(
    name = "subgrab",
    about = "Probe and download media, with optional whisper-generated subtitles"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show available formats and subtitle languages for a URL.
    Probe {
        url: String,
    },

    /// Download one media item into a fresh task workspace.
    Download {
        url: String,

        /// Engine format id (default: best single stream).
        #[arg(long)]
        format_id: Option<String>,

        /// Subtitle language to fetch from the source.
        #[arg(long)]
        subtitle_lang: Option<String>,

        /// Embed source-provided subtitles into the container.
        #[arg(long)]
        embed_subs: bool,

        /// Generate subtitles from the audio track with whisper.
        #[arg(long)]
        generate_subs: bool,

        /// Language hint for whisper ("auto" to detect).
        #[arg(long, default_value = "auto")]
        whisper_lang: String,

        /// Whisper model to use with --generate-subs.
        #[arg(long, default_value = "base")]
        model: String,

        /// Root directory for task workspaces.
        #[arg(long, default_value = "downloads")]
        output_root: PathBuf,

        /// Model cache directory.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Print the path of a finished download.
    Locate {
        task_id: String,
        filename: String,

        /// Root directory for task workspaces.
        #[arg(long, default_value = "downloads")]
        output_root: PathBuf,
    },

    /// Download a whisper model without running anything.
    DownloadModel {
        name: String,

        /// Model cache directory.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// List available whisper models.
    ListModels,

    /// List languages supported by whisper.
    ListLanguages,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subgrab=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Probe { url } => {
            let result = match subgrab::probe(&url).await {
                Ok(r) => r,
                Err(e) => fail(&e),
            };
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => fail(&e),
            }
        }

        Command::Download {
            url,
            format_id,
            subtitle_lang,
            embed_subs,
            generate_subs,
            whisper_lang,
            model,
            output_root,
            cache_dir,
        } => {
            let model = match parse_model(&model) {
                Some(m) => m,
                None => {
                    eprintln!("Unknown model: {model}");
                    eprintln!("Use list-models to see available models, or provide a path to a .ggml file");
                    std::process::exit(1);
                }
            };

            let whisper_lang = match Language::new(&whisper_lang) {
                Ok(lang) => lang,
                Err(e) => {
                    eprintln!("Error: {e}");
                    eprintln!("Use list-languages to see supported languages");
                    std::process::exit(1);
                }
            };

            let mut options = DownloadOptions::new()
                .format_id(format_id.unwrap_or_default())
                .subtitle_lang(subtitle_lang.unwrap_or_default())
                .embed_subs(embed_subs)
                .generate_subs(generate_subs)
                .model(model);
            options.whisper_lang = whisper_lang;
            if let Some(dir) = cache_dir {
                options = options.cache_dir(dir);
            }

            let downloader = Downloader::new(output_root);
            let task = match downloader.download(&url, &options).await {
                Ok(t) => t,
                Err(e) => fail(&e),
            };

            eprintln!("Saved to {}", task.path().display());
            match serde_json::to_string_pretty(&task) {
                Ok(json) => println!("{json}"),
                Err(e) => fail(&e),
            }
        }

        Command::Locate {
            task_id,
            filename,
            output_root,
        } => {
            let registry = ArtifactRegistry::new(output_root);
            match registry.lookup(&task_id, &filename) {
                Some(path) => println!("{}", path.display()),
                None => {
                    eprintln!("Not found");
                    std::process::exit(1);
                }
            }
        }

        Command::DownloadModel { name, cache_dir } => {
            let model = match parse_model(&name) {
                Some(m) => m,
                None => {
                    eprintln!("Unknown model: {name}");
                    eprintln!("Use list-models to see available models");
                    std::process::exit(1);
                }
            };
            let cache_dir =
                cache_dir.unwrap_or_else(|| DownloadOptions::default().resolve_cache_dir());
            match subgrab::model::ensure_model(&model, &cache_dir).await {
                Ok(path) => println!("Model ready: {}", path.display()),
                Err(e) => fail(&e),
            }
        }

        Command::ListModels => {
            let models = [
                ("tiny", "75 MB"),
                ("tiny.en", "75 MB"),
                ("base", "142 MB"),
                ("base.en", "142 MB"),
                ("small", "466 MB"),
                ("small.en", "466 MB"),
                ("medium", "1.5 GB"),
                ("medium.en", "1.5 GB"),
                ("large-v2", "2.9 GB"),
                ("large-v3", "2.9 GB"),
                ("large-v3-turbo", "~1.6 GB"),
            ];
            println!("{:<16} {}", "MODEL", "SIZE");
            println!("{:<16} {}", "-----", "----");
            for (name, size) in models {
                println!("{name:<16} {size}");
            }

            let cache_dir = DownloadOptions::default().resolve_cache_dir();
            let cached = subgrab::model::list_cached_models(&cache_dir);
            if !cached.is_empty() {
                println!("\nCached models in {}:", cache_dir.display());
                for path in cached {
                    println!(
                        "  {}",
                        path.file_name()
                            .map(|f| f.to_string_lossy().into_owned())
                            .unwrap_or_default()
                    );
                }
            }
        }

        Command::ListLanguages => {
            println!("{:<6} {}", "CODE", "LANGUAGE");
            println!("{:<6} {}", "----", "--------");
            for (code, name) in Language::supported() {
                println!("{code:<6} {name}");
            }
        }
    }
}

/// Parse a model name, falling back to a custom .ggml file path.
fn parse_model(name: &str) -> Option<WhisperModel> {
    WhisperModel::parse_name(name).or_else(|| {
        let path = PathBuf::from(name);
        path.exists().then(|| WhisperModel::Custom(path))
    })
}

fn fail(e: &dyn std::error::Error) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}
