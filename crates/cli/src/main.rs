use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_source::{Catalog, EntityKind, GeoPoint, InMemoryDataSource};
use pipeline::Recommendation;
use resilience::CancellationToken;
use server::{AppConfig, AppState, build_state};
use sources::{RecommendationContext, RecommendationRequest, RecommendationType};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// Civic Recs - politician and content recommendations
#[derive(Parser)]
#[command(name = "civic-recs")]
#[command(about = "Recommendations, search and feedback over a civic catalog", long_about = None)]
struct Cli {
    /// Path to the catalog dataset
    #[arg(short, long, env = "CIVIC_RECS_DATASET", default_value = "data/catalog.json")]
    dataset: PathBuf,

    /// Optional TOML config (engine weights, retry presets)
    #[arg(short, long, env = "CIVIC_RECS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: String,

        /// politician, content or search
        #[arg(long, default_value = "politician")]
        r#type: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Entity ids to leave out (repeat or comma-separate)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Entity the user is currently viewing
        #[arg(long)]
        current: Option<String>,

        /// Free-text query (used by the search type and for relevance)
        #[arg(long)]
        query: Option<String>,

        /// Caller latitude (requires --lng)
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Caller longitude (requires --lat)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,

        /// Show which signals contributed to each score
        #[arg(long)]
        explain: bool,
    },

    /// Typeahead suggestions for a name fragment
    Suggest {
        #[arg(long)]
        query: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Politicians similar to a given one
    Related {
        /// Politician ID
        #[arg(long)]
        id: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record feedback and show how it moves the user's recommendations
    Feedback {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        recommendation_id: String,

        /// like, dislike, not_interested or clicked
        #[arg(long)]
        feedback: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    println!("Loading catalog from {}...", cli.dataset.display());
    let start = Instant::now();
    let catalog = Catalog::load_from_file(&cli.dataset).context("Failed to load catalog")?;
    let (politicians, content) = catalog.counts();
    println!(
        "{} Loaded {} politicians and {} content items in {:?}",
        "✓".green(),
        politicians,
        content,
        start.elapsed()
    );

    let state = build_state(Arc::new(InMemoryDataSource::new(Arc::new(catalog))), &config);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            r#type,
            limit,
            exclude,
            current,
            query,
            lat,
            lng,
            explain,
        } => {
            let context = RecommendationContext {
                current_entity_id: current,
                search_query: query,
                location: lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng)),
                ..RecommendationContext::default()
            };
            let request = RecommendationRequest::new(user_id, r#type.parse()?)
                .with_limit(limit)
                .with_excluded(exclude)
                .with_context(context);
            handle_recommend(&state, request, explain).await?
        }
        Commands::Suggest { query, limit } => handle_suggest(&state, &query, limit).await?,
        Commands::Related { id, limit } => handle_related(&state, &id, limit).await?,
        Commands::Feedback {
            user_id,
            recommendation_id,
            feedback,
        } => handle_feedback(&state, &user_id, &recommendation_id, &feedback).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&state, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(state: &AppState, request: RecommendationRequest, explain: bool) -> Result<()> {
    let start = Instant::now();
    let recommendations = state
        .engine
        .generate_recommendations(&request, &CancellationToken::new())
        .await?;
    debug!("Recommendations computed in {:?}", start.elapsed());

    println!(
        "{}",
        format!("Recommendations for {} ({:?}):", request.user_id, request.kind)
            .bold()
            .blue()
    );
    if recommendations.is_empty() {
        println!("  (none)");
    }

    let catalog = state.engine.data_source();
    for (rank, rec) in recommendations.iter().enumerate() {
        let name = catalog
            .entity(&rec.entity_id)
            .await?
            .map(|e| e.name)
            .unwrap_or_default();
        println!(
            "{}. {} [{}] - Score: {:.3}",
            (rank + 1).to_string().green(),
            name,
            rec.entity_id,
            rec.score
        );
        if explain {
            let reasons = rec
                .reasons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("   Signals: {}", reasons.dimmed());
        }
    }
    Ok(())
}

/// Handle the 'suggest' command
async fn handle_suggest(state: &AppState, query: &str, limit: Option<usize>) -> Result<()> {
    let suggestions = state
        .search
        .get_suggestions(query, limit, &CancellationToken::new())
        .await?;

    println!("{}", format!("Suggestions for '{}':", query).bold().blue());
    if suggestions.is_empty() {
        println!("  (none)");
    }
    for name in suggestions {
        println!("{}{}", "• ".green(), name);
    }
    Ok(())
}

/// Handle the 'related' command
async fn handle_related(state: &AppState, id: &str, limit: Option<usize>) -> Result<()> {
    let related = state
        .search
        .get_related_politicians(id, limit, &CancellationToken::new())
        .await?;

    println!("{}", format!("Politicians related to {}:", id).bold().blue());
    if related.is_empty() {
        println!("  (none)");
    }
    for rel in related {
        println!(
            "{}{} [{}] similarity {:.2} (shared: {})",
            "• ".green(),
            rel.entity.name,
            rel.entity.id,
            rel.similarity,
            rel.shared_attributes.join(", ")
        );
    }
    Ok(())
}

/// Handle the 'feedback' command
///
/// The in-memory store lives only as long as this process, so the
/// before/after ranking is shown within a single run.
async fn handle_feedback(
    state: &AppState,
    user_id: &str,
    recommendation_id: &str,
    feedback: &str,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let entity = state
        .engine
        .data_source()
        .entity(recommendation_id)
        .await?
        .ok_or_else(|| anyhow!("Entity {} not found", recommendation_id))?;
    let kind = match entity.kind {
        EntityKind::Politician => RecommendationType::Politician,
        EntityKind::Content => RecommendationType::Content,
    };
    let request = RecommendationRequest::new(user_id, kind).with_limit(state.engine.settings().max_limit);

    let rank_of = |recs: &[Recommendation]| recs.iter().position(|r| r.entity_id == recommendation_id);

    let before = state.engine.generate_recommendations(&request, &cancel).await?;
    let event = state
        .engine
        .update_recommendation_models(user_id, recommendation_id, feedback, &cancel)
        .await?;
    let after = state.engine.generate_recommendations(&request, &cancel).await?;

    println!(
        "{} Recorded '{}' from {} on {} at {}",
        "✓".green(),
        event.feedback,
        event.user_id,
        entity.name,
        event.timestamp
    );
    let show = |rank: Option<usize>| rank.map(|r| (r + 1).to_string()).unwrap_or_else(|| "-".to_string());
    println!(
        "Rank: {} -> {} (affinity {:.2})",
        show(rank_of(&before[..])),
        show(rank_of(&after[..])),
        state.engine.affinity().get(user_id, recommendation_id).unwrap_or(0.0)
    );
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(state: &AppState, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let types = [
        RecommendationType::Politician,
        RecommendationType::Content,
        RecommendationType::Search,
    ];

    let wall_clock = Instant::now();
    let mut handles = vec![];
    for _ in 0..requests {
        // Random user ids so affinity lookups miss and hit like real traffic
        let user_id = format!("user-{}", rand::random::<u32>() % 1000 + 1);
        let kind = types[rand::random::<u32>() as usize % types.len()];
        let request = RecommendationRequest::new(user_id, kind).with_context(RecommendationContext {
            search_query: Some("housing".to_string()),
            ..RecommendationContext::default()
        });

        let engine = state.engine.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            engine
                .generate_recommendations(&request, &CancellationToken::new())
                .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = wall_clock.elapsed();

    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / wall_time.as_secs_f64()
    );

    Ok(())
}
