use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use textcatvis::cluster::cluster_texts;
use textcatvis::config::Config;
use textcatvis::corpus::loader::load_data;
use textcatvis::corpus::subset::select_subset;
use textcatvis::models::linear::ClassifierPolicy;
use textcatvis::output::terminal;
use textcatvis::pipeline::analyze::{prepare_corpus, run_analysis};
use textcatvis::pipeline::artifacts::{
    dataset_name, html_dir, wordcloud_dir, write_explanation_pages, write_tfidf_pages,
    write_wordclouds,
};
use textcatvis::query::Query;
use textcatvis::scoring::classifier::classifier_scores;
use textcatvis::scoring::distinctive::{distinctive_scores, DistinctiveFn};
use textcatvis::scoring::tfidf::tfidf_scores;

/// textcatvis: visualize which words characterize the categories of a text corpus.
///
/// A dataset is a folder with one subfolder of .txt documents per category.
/// Documents directly in the folder are unlabelled and get clustered.
#[derive(Parser)]
#[command(name = "textcatvis", version, about)]
struct Cli {
    /// Root directory for results (overrides TEXTCATVIS_RESULTS_DIR)
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Number of words per category shown in the terminal
    #[arg(long, global = true, default_value = "15")]
    top: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: tf-idf, distinctive words and classifier word clouds
    Analyze {
        /// Path to the dataset folder
        dataset: PathBuf,

        /// Queries to count per category, e.g. brain, and:trump,obama, or:a,b
        #[arg(long = "query")]
        queries: Vec<String>,
    },

    /// Word clouds from summed tf-idf weights
    Tfidf {
        dataset: PathBuf,

        /// Also write highlighted pages for the visualization documents
        #[arg(long)]
        html: bool,

        /// Documents to visualize (default: 1000 random ones)
        #[arg(long = "visualize")]
        visualize_ids: Vec<String>,
    },

    /// Word clouds of distinctive words
    Distinctive {
        dataset: PathBuf,

        /// Score function: tpr, diff, tprmean, tprmult, quot or quotdiff
        #[arg(long)]
        score: Option<DistinctiveFn>,
    },

    /// Word clouds from classifier attributions
    Clf {
        dataset: PathBuf,

        /// Also write per-document explanation pages
        #[arg(long)]
        html: bool,

        /// Classifier: svm or logreg (overrides TEXTCATVIS_CLASSIFIER)
        #[arg(long)]
        classifier: Option<ClassifierPolicy>,

        /// Documents to visualize (default: 1000 random ones)
        #[arg(long = "visualize")]
        visualize_ids: Vec<String>,
    },

    /// Cluster the documents of a dataset and report the clusters
    Cluster { dataset: PathBuf },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("textcatvis=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(dir) = cli.results_dir {
        config.results_dir = dir;
    }
    config.validate()?;

    match cli.command {
        Commands::Analyze { dataset, queries } => {
            let queries = queries
                .iter()
                .map(|q| q.parse::<Query>())
                .collect::<Result<Vec<_>>>()?;
            let (name, texts, doccats) = load(&dataset)?;

            let prepared = prepare_corpus(&texts, &doccats, &[], &config)?;
            if let Some(clusters) = &prepared.clusters {
                terminal::display_cluster_summary(clusters);
            }
            let analysis = run_analysis(prepared, &config, &queries)?;

            let dir = wordcloud_dir(&config.results_dir, &name, "tfidf");
            write_wordclouds(&analysis.tfidf.category_scores, &dir, "tfidf")?;
            terminal::display_top_words("TF-IDF", &analysis.tfidf.category_scores, cli.top);

            let dir = wordcloud_dir(&config.results_dir, &name, "distinctive");
            write_wordclouds(&analysis.distinctive, &dir, "distinctive")?;
            terminal::display_top_words("Distinctive words", &analysis.distinctive, cli.top);

            if let Some(clf) = &analysis.classifier {
                let dir = wordcloud_dir(&config.results_dir, &name, "clf");
                write_wordclouds(&clf.category_scores, &dir, "clf")?;
                terminal::display_classifier_report(&clf.report);
                terminal::display_top_words("Classifier", &clf.category_scores, cli.top);
            }

            if let Some(occurrences) = &analysis.occurrences {
                terminal::display_occurrences(occurrences);
            }
            println!(
                "\n{}",
                format!("Results written to {}", config.results_dir.display()).bold()
            );
        }

        Commands::Tfidf {
            dataset,
            html,
            visualize_ids,
        } => {
            let (name, texts, doccats) = load(&dataset)?;
            let subset = select_subset(&texts, &doccats, &visualize_ids)?;
            let result = tfidf_scores(&subset.texts, &subset.doccats, &subset.visualize_ids, html)?;

            let dir = wordcloud_dir(&config.results_dir, &name, "tfidf");
            let clouds = write_wordclouds(&result.category_scores, &dir, "tfidf")?;
            info!(clouds, dir = %dir.display(), "Wrote word clouds");
            if html {
                let dir = html_dir(&config.results_dir, &name, "tfidf");
                let pages =
                    write_tfidf_pages(&subset.texts, &subset.doccats, &result.document_scores, &dir)?;
                info!(pages, dir = %dir.display(), "Wrote highlighted documents");
            }
            terminal::display_top_words("TF-IDF", &result.category_scores, cli.top);
        }

        Commands::Distinctive { dataset, score } => {
            let (name, texts, doccats) = load(&dataset)?;
            let subset = select_subset(&texts, &doccats, &[])?;
            let score_fn = score.unwrap_or(config.distinctive);
            let scores = distinctive_scores(&subset.texts, &subset.doccats, score_fn)?;

            let dir = wordcloud_dir(&config.results_dir, &name, "distinctive");
            let clouds = write_wordclouds(&scores, &dir, "distinctive")?;
            info!(clouds, dir = %dir.display(), "Wrote word clouds");
            terminal::display_top_words("Distinctive words", &scores, cli.top);
        }

        Commands::Clf {
            dataset,
            html,
            classifier,
            visualize_ids,
        } => {
            let (name, texts, doccats) = load(&dataset)?;
            let subset = select_subset(&texts, &doccats, &visualize_ids)?;
            let policy = classifier.unwrap_or(config.classifier);
            let result = classifier_scores(
                &subset.texts,
                &subset.doccats,
                &subset.visualize_ids,
                policy,
                html,
            )?;

            let dir = wordcloud_dir(&config.results_dir, &name, "clf");
            let clouds = write_wordclouds(&result.category_scores, &dir, "clf")?;
            info!(clouds, dir = %dir.display(), "Wrote word clouds");
            if html {
                let dir = html_dir(&config.results_dir, &name, "clf");
                let pages = write_explanation_pages(&subset.texts, &result.explanations, &dir)?;
                info!(pages, dir = %dir.display(), "Wrote explanation pages");
            }
            terminal::display_classifier_report(&result.report);
            terminal::display_top_words("Classifier", &result.category_scores, cli.top);
        }

        Commands::Cluster { dataset } => {
            let (_, texts, doccats) = load(&dataset)?;
            let subset = select_subset(&texts, &doccats, &[])?;
            let assignment = cluster_texts(&subset.texts, config.cluster)?;
            terminal::display_cluster_summary(&assignment);
            for (doc_id, cluster) in &assignment.labels {
                println!("  {:<40} {}", doc_id, cluster);
            }
        }
    }

    Ok(())
}

/// Load a dataset folder and report what was found.
fn load(
    path: &Path,
) -> Result<(
    String,
    textcatvis::corpus::TextDict,
    textcatvis::corpus::DocCategories,
)> {
    let name = dataset_name(path);
    info!(dataset = %name, "Loading data");
    let (texts, doccats) = load_data(path)?;
    info!(
        documents = texts.len(),
        categories = textcatvis::corpus::category_count(&doccats),
        "Dataset loaded"
    );
    Ok((name, texts, doccats))
}
