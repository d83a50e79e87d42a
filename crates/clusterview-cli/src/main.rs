use anyhow::{Context, Result};
use clap::Parser;
use clusterview_core::{Cluster, ClusterPayload, ClusterSummary, holder_first, validate_clusters};
use clusterview_events::{Event, EventBus, EventListener};
use clusterview_graph::{GraphSession, GraphSettings, RenderFrame};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lay out and pack wallet clusters", long_about = None)]
struct Args {
    /// Cluster payload (`{"data": [...]}` or a bare array); `-` reads stdin
    #[arg(short, long)]
    input: PathBuf,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long)]
    width: Option<f32>,

    /// Canvas height in pixels
    #[arg(long)]
    height: Option<f32>,

    /// Seed for a reproducible layout
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the committed frame; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the cluster list summary instead of the frame
    #[arg(long)]
    summary: bool,

    /// Refuse payloads with dangling links, duplicate accounts or bad volumes
    #[arg(long)]
    strict: bool,
}

/// Logs bus traffic and remembers what the user should hear about.
#[derive(Default)]
struct EventLog {
    issues: usize,
    timed_out: bool,
}

impl EventListener for EventLog {
    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::IntegrityIssue { cluster, message } => {
                self.issues += 1;
                tracing::warn!("cluster {}: {}", cluster, message);
            }
            Event::LayoutTimedOut { .. } => {
                self.timed_out = true;
                tracing::debug!("{:?}", event);
            }
            other => tracing::debug!("{:?}", other),
        }
    }
}

fn load_settings(args: &Args) -> Result<GraphSettings> {
    let mut settings = match &args.config {
        Some(path) => GraphSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => GraphSettings::default(),
    };

    if let Some(width) = args.width {
        settings.canvas.width = width;
    }
    if let Some(height) = args.height {
        settings.canvas.height = height;
    }
    if args.seed.is_some() {
        settings.layout.seed = args.seed;
    }
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn read_clusters(path: &Path) -> Result<Vec<Cluster>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading clusters from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    ClusterPayload::from_json(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn summary_text(clusters: &[Cluster]) -> String {
    let mut out = ClusterSummary::from_clusters(clusters).headline();
    out.push('\n');
    for cluster in clusters {
        out.push_str(&ClusterSummary::cluster_line(cluster));
        out.push('\n');
        for account in holder_first(&cluster.accounts) {
            let role = if account.is_anchor() { "holder" } else { "associate" };
            out.push_str(&format!(
                "  {} [{} L{}] {}\n",
                account.address,
                role,
                account.level,
                clusterview_core::format_usd(account.volume_usd)
            ));
        }
    }
    out
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}

fn render(settings: GraphSettings, clusters: &[Cluster], bus: &EventBus) -> Result<RenderFrame> {
    let mut session = GraphSession::new(settings, bus.clone());
    session.redraw(clusters);
    session
        .wait()
        .cloned()
        .context("layout finished without committing a frame")
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    let clusters = read_clusters(&args.input)?;
    tracing::info!("Loaded {} clusters from {}", clusters.len(), args.input.display());

    if args.strict {
        validate_clusters(&clusters).context("cluster payload failed validation")?;
    }

    if args.summary {
        return write_output(args.output.as_deref(), summary_text(&clusters).trim_end());
    }

    let bus = EventBus::new();
    let frame = render(settings, &clusters, &bus)?;

    let mut log = EventLog::default();
    bus.dispatch_to(&mut log);
    if log.timed_out {
        tracing::warn!("Layout did not settle in time; frame uses seed positions");
    }
    if log.issues > 0 {
        tracing::warn!("{} elements were dropped from the payload", log.issues);
    }

    let json = serde_json::to_string_pretty(&frame).context("serializing frame")?;
    write_output(args.output.as_deref(), &json)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    run(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterview_core::{Account, AccountLink};
    use tempfile::tempdir;

    const PAYLOAD: &str = r#"{"data": [
        {"id": 1, "accounts": [
            {"address": "holder", "level": 0, "volumeUsd": 10},
            {"address": "big", "level": 1, "volumeUsd": "2500.5"}
        ], "accountLinks": [{"source": "holder", "target": "big", "volumeUsd": 5}],
         "totalVol": 2510.5, "totalPct": 1.5}
    ]}"#;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["clusterview", "--input", "clusters.json"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_settings() -> Result<()> {
        let dir = tempdir()?;
        let config = dir.path().join("settings.json");
        fs::write(&config, r#"{"canvas": {"width": 640}, "layout_timeout_ms": 250}"#)?;

        let config_arg = config.to_string_lossy().to_string();
        let settings = load_settings(&args(&[
            "--config",
            &config_arg,
            "--height",
            "480",
            "--seed",
            "5",
        ]))?;
        assert_eq!(settings.canvas.width, 640.0);
        assert_eq!(settings.canvas.height, 480.0);
        assert_eq!(settings.layout.seed, Some(5));
        assert_eq!(settings.layout_timeout_ms, 250);
        Ok(())
    }

    #[test]
    fn test_read_clusters_accepts_string_volumes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("clusters.json");
        fs::write(&path, PAYLOAD)?;

        let clusters = read_clusters(&path)?;
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].accounts[1].volume_usd, 2500.5);
        Ok(())
    }

    #[test]
    fn test_summary_lists_holder_first() {
        let cluster = Cluster::new(
            7,
            vec![
                Account::new("small", 2, 1.0),
                Account::new("anchor", 0, 0.0),
                Account::new("large", 1, 1_500.0),
            ],
            vec![AccountLink::new("anchor", "large", 1.0)],
        );
        let text = summary_text(&[cluster]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Found 1 clusters (0.00% of supply)");
        assert!(lines[2].contains("anchor [holder L0]"));
        assert!(lines[3].contains("large [associate L1] $1,500"));
        assert!(lines[4].contains("small"));
    }

    #[test]
    fn test_run_writes_frame_json() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("clusters.json");
        let output = dir.path().join("frame.json");
        fs::write(&input, PAYLOAD)?;

        run(Args {
            input,
            config: None,
            width: None,
            height: None,
            seed: Some(3),
            output: Some(output.clone()),
            summary: false,
            strict: true,
        })?;

        let frame: serde_json::Value = serde_json::from_str(&fs::read_to_string(output)?)?;
        assert_eq!(frame["generation"], 1);
        assert_eq!(frame["outcome"], "Stopped");
        assert_eq!(frame["nodes"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn test_strict_rejects_dangling_link() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("clusters.json");
        fs::write(
            &input,
            r#"[{"id": 2, "accounts": [{"address": "a", "level": 0, "volumeUsd": 1}],
                "accountLinks": [{"source": "a", "target": "missing"}]}]"#,
        )?;

        let err = run(Args {
            input,
            config: None,
            width: None,
            height: None,
            seed: None,
            output: None,
            summary: false,
            strict: true,
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("missing"));
        Ok(())
    }
}
