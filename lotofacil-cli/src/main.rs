mod display;
mod import;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use lotofacil_db::db::{count_draws, db_path, fetch_draw, fetch_draws_before, fetch_last_draws, last_contest, migrate, open_db};
use lotofacil_db::models::{Draw, NumberSet, DRAW_SIZE};
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::backtest::{backtest, pool_coverage};
use lotofacil_engine::config::{parse_number_list, EngineConfig};
use lotofacil_engine::features::Features;
use lotofacil_engine::filters::{Bounds, CoreFilter, FilterChain, FilterConfig};
use lotofacil_engine::generator::{ComplementaryGenerator, GenerationReport, MAX_BET_SIZE};
use lotofacil_engine::persistence::{
    read_combinations, save_json, timestamp, write_combinations, GenerationSummary,
};
use lotofacil_engine::pools::{PoolParams, PoolStrategy};
use lotofacil_engine::positional::{positional_debits, PositionalTable, DEFAULT_DEBIT_RATIO};
use lotofacil_engine::reducer::reduce;
use lotofacil_engine::sampler::{date_seed, sample_combinations};
use lotofacil_engine::scoring::{rank_candidates, ScoringConfig};
use lotofacil_engine::stats::{compute_stats, debit_index, FrequencyTable};
use lotofacil_engine::EngineError;

use crate::display::{
    display_backtest, display_candidates, display_coverage, display_debit, display_draws,
    display_features, display_generation_report, display_hits, display_import_summary,
    display_heatmap, display_pools, display_positional, display_positional_debits, display_stats,
};

/// Nombre de meilleures combinaisons affichées et gardées dans le résumé JSON.
const SUMMARY_TOP: usize = 10;

#[derive(Parser)]
#[command(name = "lotofacil", about = "Analyseur et générateur de combinaisons Lotofácil")]
struct Cli {
    /// Chemin de la base SQLite (sinon $LOTOFACIL_DB ou ./data/lotofacil.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV (export Caixa)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "assets/lotofacil.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher les statistiques (fréquences, retards, tendances)
    Stats {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "50")]
        window: u32,
    },

    /// Analyse par position du tirage trié (N1 à N15)
    Positional {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "100")]
        last: u32,

        /// Afficher la carte de chaleur valeur × position
        #[arg(long)]
        heatmap: bool,

        /// Comparer les N derniers tirages aux précédents (débits positionnels)
        #[arg(short, long)]
        recent: Option<usize>,
    },

    /// Classer les numéros par indice de débit
    Debit {
        /// Fenêtre courte
        #[arg(short, long, default_value = "5")]
        short: usize,

        /// Fenêtre longue
        #[arg(short, long, default_value = "50")]
        long: usize,
    },

    /// Proposer un pool de base et un complément
    Pools(PoolArgs),

    /// Générer les combinaisons base + complément filtrées
    Generate(GenerateArgs),

    /// Tirer des combinaisons aléatoires pondérées par la fréquence
    Sample(SampleArgs),

    /// Réduire un fichier de combinaisons (variations de couverture)
    Reduce(ReduceArgs),

    /// Confronter un fichier de combinaisons aux derniers tirages
    Backtest(BacktestArgs),

    /// Mesurer la couverture d'une stratégie de pools (walk-forward)
    Coverage {
        #[command(flatten)]
        pools: PoolArgs,

        /// Nombre de tirages testés
        #[arg(short, long, default_value = "50")]
        tests: usize,
    },

    /// Analyser une combinaison (caractéristiques et points récents)
    Analyze {
        /// Numéros, ex. "1,2,3,..." ou "1-10,12,15-18"
        numbers: String,

        /// Nombre de tirages confrontés
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Ajouter un tirage manuellement
    Add,

    /// Mode interactif (menu)
    Interactive,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FilterArgs {
    /// Somme des numéros, ex. 170-210
    #[arg(long)]
    sum: Option<Bounds>,

    /// Nombre de pairs, ex. 6-9
    #[arg(long)]
    evens: Option<Bounds>,

    /// Nombre de premiers, ex. 4-6
    #[arg(long)]
    primes: Option<Bounds>,

    /// Nombre de Fibonacci, ex. 3-5
    #[arg(long)]
    fibonacci: Option<Bounds>,

    /// Plus longue suite de consécutifs autorisée
    #[arg(long)]
    max_run: Option<u32>,

    /// Numéros répétés du tirage de référence, ex. 8-10
    #[arg(long)]
    overlap: Option<Bounds>,

    /// Concours de référence pour --overlap (défaut : le dernier)
    #[arg(long, requires = "overlap")]
    reference: Option<u32>,

    /// Noyau de numéros, ex. 1-12
    #[arg(long, requires = "core_min")]
    core: Option<String>,

    /// Minimum de numéros du noyau
    #[arg(long)]
    core_min: Option<u32>,
}

impl FilterArgs {
    /// Les options passées en ligne de commande remplacent celles du fichier.
    fn apply(&self, config: &mut FilterConfig) -> Result<()> {
        let overrides = [
            (&mut config.sum, self.sum),
            (&mut config.evens, self.evens),
            (&mut config.primes, self.primes),
            (&mut config.fibonacci, self.fibonacci),
            (&mut config.overlap, self.overlap),
        ];
        for (slot, value) in overrides {
            if value.is_some() {
                *slot = value;
            }
        }
        if self.max_run.is_some() {
            config.max_run = self.max_run;
        }
        if let Some(core) = &self.core {
            config.core = Some(CoreFilter {
                numbers: parse_number_list(core)?.to_vec(),
                minimum: self.core_min.unwrap_or_default(),
            });
        } else if let Some(minimum) = self.core_min {
            match config.core.as_mut() {
                Some(core) => core.minimum = minimum,
                None => bail!("--core-min sans noyau (--core ou [filters.core])"),
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct PoolArgs {
    /// Stratégie : frequency ou debit
    #[arg(long, default_value = "frequency")]
    strategy: PoolStrategy,

    /// Taille du pool de base
    #[arg(long, default_value = "20")]
    base_size: usize,

    /// Fenêtre de fréquence (ou fenêtre courte pour debit)
    #[arg(short, long, default_value = "50")]
    window: usize,

    /// Fenêtre longue (debit)
    #[arg(long, default_value = "50")]
    long_window: usize,

    /// Numéros exclus (debit)
    #[arg(long, default_value = "2")]
    exclude: usize,
}

impl PoolArgs {
    fn params(&self) -> PoolParams {
        PoolParams {
            strategy: self.strategy,
            base_size: self.base_size,
            window: self.window,
            long_window: self.long_window,
            exclude: self.exclude,
        }
    }

    fn history(&self) -> usize {
        match self.strategy {
            PoolStrategy::Frequency => self.window,
            PoolStrategy::Debit => self.window.max(self.long_window),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct GenerateArgs {
    /// Fichier de configuration TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pool de base, ex. 1-20
    #[arg(short, long)]
    base: Option<String>,

    /// Pool complémentaire (défaut : les numéros hors base)
    #[arg(long)]
    complement: Option<String>,

    /// Numéros pris dans la base (raccourci pour --k-min et --k-max)
    #[arg(short, long)]
    k: Option<usize>,

    #[arg(long)]
    k_min: Option<usize>,

    #[arg(long)]
    k_max: Option<usize>,

    /// Taille des combinaisons (15-20)
    #[arg(long)]
    size: Option<usize>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Arrêter après N combinaisons retenues
    #[arg(long)]
    limit: Option<usize>,

    /// Garder les N meilleures après classement
    #[arg(long)]
    top: Option<usize>,

    /// Fichier de sortie
    #[arg(short, long, default_value = "combinaisons.txt")]
    output: PathBuf,

    /// Écrire aussi un résumé JSON à côté du fichier de sortie
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SampleArgs {
    /// Nombre de combinaisons
    #[arg(short, long, default_value = "10")]
    count: usize,

    /// Taille des combinaisons (15-20)
    #[arg(long, default_value = "15")]
    size: usize,

    /// Fenêtre de fréquence
    #[arg(short, long, default_value = "50")]
    window: u32,

    /// Seed pour la reproductibilité (défaut : date du jour)
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Fichier de sortie (facultatif)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ReduceArgs {
    /// Fichier des combinaisons de base
    #[arg(short, long)]
    input: PathBuf,

    /// Fichier de sortie
    #[arg(short, long, default_value = "reduites.txt")]
    output: PathBuf,

    /// Fichier de configuration TOML (section [reducer])
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Numéros gardés de chaque base, minimum
    #[arg(long)]
    min_keep: Option<usize>,

    /// Numéros gardés de chaque base, maximum
    #[arg(long)]
    max_keep: Option<usize>,

    /// Seuil de similarité du regroupement (0-1)
    #[arg(long)]
    similarity: Option<f64>,

    /// Distance minimale entre combinaisons retenues
    #[arg(long)]
    min_distance: Option<usize>,

    /// Nombre maximal de combinaisons produites
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct BacktestArgs {
    /// Fichier de combinaisons
    #[arg(short, long)]
    input: PathBuf,

    /// Nombre de tirages confrontés
    #[arg(short, long, default_value = "100")]
    last: u32,

    /// Ne garder que les tirages antérieurs à ce concours
    #[arg(long)]
    before: Option<u32>,

    /// Fichier de configuration TOML (section [prizes])
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Concours détaillés dans le tableau
    #[arg(long, default_value = "10")]
    detail: usize,

    /// Écrire le rapport en JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let path = cli.db.unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { window } => cmd_stats(&conn, window),
        Command::Positional { last, heatmap, recent } => cmd_positional(&conn, last, heatmap, recent),
        Command::Debit { short, long } => cmd_debit(&conn, short, long),
        Command::Pools(args) => cmd_pools(&conn, &args),
        Command::Generate(args) => cmd_generate(&conn, &args),
        Command::Sample(args) => cmd_sample(&conn, &args),
        Command::Reduce(args) => cmd_reduce(&args),
        Command::Backtest(args) => cmd_backtest(&conn, &args),
        Command::Coverage { pools, tests } => cmd_coverage(&conn, &pools, tests),
        Command::Analyze { numbers, last } => cmd_analyze(&conn, &numbers, last),
        Command::Add => interactive::cmd_add(&conn),
        Command::Interactive => interactive::run_interactive(&conn),
    }
}

fn ensure_draws(conn: &Connection) -> Result<u32> {
    let n = count_draws(conn)?;
    if n == 0 {
        bail!("Base vide. Lancez d'abord : lotofacil import");
    }
    Ok(n)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("Impossible de charger la configuration {:?}", p)),
        None => Ok(EngineConfig::default()),
    }
}

/// Tirage de référence du filtre de répétés : concours explicite, liste du
/// fichier de configuration, ou dernier concours de la base.
fn resolve_reference(conn: &Connection, config: &FilterConfig, contest: Option<u32>) -> Result<Option<NumberSet>> {
    if !config.needs_reference() {
        return Ok(None);
    }
    if let Some(contest) = contest {
        let draw = fetch_draw(conn, contest)?
            .ok_or_else(|| EngineError::NotFound(format!("concours {contest}")))?;
        return Ok(Some(draw.set()));
    }
    if let Some(numbers) = &config.reference {
        let set = NumberSet::from_numbers(numbers).ok_or_else(|| {
            EngineError::InvalidConfig(format!("tirage de référence invalide : {:?}", numbers))
        })?;
        return Ok(Some(set));
    }
    let last = last_contest(conn)?
        .ok_or_else(|| EngineError::NotFound("aucun tirage de référence (base vide)".into()))?;
    let draw = fetch_draw(conn, last)?
        .ok_or_else(|| EngineError::NotFound(format!("concours {last}")))?;
    tracing::info!(contest = last, "tirage de référence : dernier concours");
    Ok(Some(draw.set()))
}

fn describe_filters(config: &FilterConfig) -> String {
    let mut parts = Vec::new();
    let bounds = [
        ("somme", config.sum),
        ("pairs", config.evens),
        ("premiers", config.primes),
        ("fibonacci", config.fibonacci),
        ("répétés", config.overlap),
    ];
    for (label, value) in bounds {
        if let Some(b) = value {
            parts.push(format!("{label} {b}"));
        }
    }
    if let Some(max) = config.max_run {
        parts.push(format!("suite ≤ {max}"));
    }
    if let Some(core) = &config.core {
        parts.push(format!("noyau ≥ {} sur {}", core.minimum, core.numbers.len()));
    }
    if parts.is_empty() {
        "aucun".to_string()
    } else {
        parts.join(", ")
    }
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

pub(crate) fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

pub(crate) fn cmd_stats(conn: &Connection, window: u32) -> Result<()> {
    let n = ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, window.min(n))?;
    let stats = compute_stats(&draws);
    display_stats(&stats, draws.len());
    Ok(())
}

pub(crate) fn cmd_positional(conn: &Connection, last: u32, heatmap: bool, recent: Option<usize>) -> Result<()> {
    let n = ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, last.min(n))?;
    let table = PositionalTable::from_draws(&draws);
    display_positional(&table.summary(), table.window());
    if heatmap {
        display_heatmap(&table);
    }
    if let Some(recent) = recent {
        let debits = positional_debits(&draws, recent, DEFAULT_DEBIT_RATIO)?;
        display_positional_debits(&debits, recent, draws.len() - recent);
    }
    Ok(())
}

pub(crate) fn cmd_debit(conn: &Connection, short: usize, long: usize) -> Result<()> {
    ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, short.max(long) as u32)?;
    let entries = debit_index(&draws, short, long)?;
    display_debit(&entries, short, long.min(draws.len()));
    Ok(())
}

pub(crate) fn cmd_pools(conn: &Connection, args: &PoolArgs) -> Result<()> {
    ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, args.history() as u32)?;
    let split = args.params().split(&draws)?;
    println!(
        "\nPools ({}, {} tirages) :\n",
        args.strategy,
        draws.len()
    );
    display_pools(&split);
    Ok(())
}

/// Énumération filtrée ; la barre avance à chaque candidat énuméré, retenu ou non.
fn enumerate_with_progress(
    generator: &ComplementaryGenerator,
    chain: &FilterChain,
    limit: Option<usize>,
    pb: &ProgressBar,
) -> (Vec<NumberSet>, GenerationReport) {
    let mut accepted = Vec::new();
    let mut it = generator.filter(pb.wrap_iter(generator.candidates()), chain);
    for set in it.by_ref() {
        accepted.push(set);
        pb.set_message(format!("{} retenues", accepted.len()));
        if limit.is_some_and(|n| accepted.len() >= n) {
            tracing::info!(limit = accepted.len(), "limite atteinte");
            break;
        }
    }
    (accepted, it.into_report())
}

pub(crate) fn cmd_generate(conn: &Connection, args: &GenerateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let settings = &mut config.generator;
    if args.base.is_some() {
        settings.base = args.base.clone();
    }
    if args.complement.is_some() {
        settings.complement = args.complement.clone();
    }
    if let Some(k) = args.k {
        settings.k_min = k;
        settings.k_max = k;
    }
    if let Some(k) = args.k_min {
        settings.k_min = k;
    }
    if let Some(k) = args.k_max {
        settings.k_max = k;
    }
    if let Some(size) = args.size {
        settings.target_size = size;
    }
    if args.limit.is_some() {
        settings.limit = args.limit;
    }
    if args.top.is_some() {
        settings.top = args.top;
    }
    args.filters.apply(&mut config.filters)?;

    let generator = config.generator.build()?;
    let reference = resolve_reference(conn, &config.filters, args.filters.reference)?;
    let chain = FilterChain::from_config(&config.filters, reference)?;

    let total = generator.total_candidates();
    println!(
        "Base {} | Complément {} | k {}-{} | taille {} | {} candidats",
        generator.base(),
        generator.complement(),
        generator.k_range().start(),
        generator.k_range().end(),
        generator.target(),
        total
    );
    println!("Filtres : {}", describe_filters(&config.filters));
    if generator.pools_overlap() {
        tracing::warn!("les pools se recouvrent : unions courtes et doublons seront ignorés");
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let (accepted, report) = enumerate_with_progress(&generator, &chain, config.generator.limit, &pb);
    pb.finish_with_message(format!("{} retenues", accepted.len()));

    display_generation_report(&report, total);

    let draws = fetch_last_draws(conn, config.scoring.window.max(config.scoring.long_window) as u32)?;
    let scoring = if draws.is_empty() {
        tracing::warn!("base vide : classement par équilibre seulement");
        ScoringConfig {
            frequency_weight: 0.0,
            debit_weight: 0.0,
            balance_weight: 1.0,
            ..config.scoring.clone()
        }
    } else {
        config.scoring.clone()
    };
    let scorer = scoring.build(&draws)?;
    let ranked = rank_candidates(accepted, &scorer, config.generator.top);

    if ranked.is_empty() {
        tracing::warn!("aucune combinaison ne satisfait les filtres");
        println!("Aucune combinaison retenue : le fichier sera vide.");
    }

    let combinations: Vec<NumberSet> = ranked.iter().map(|c| c.numbers).collect();
    let header = vec![
        format!("Lotofácil : {} combinaisons de {} numéros", combinations.len(), generator.target()),
        format!("base {} | complément {}", generator.base().to_csv_line(), generator.complement().to_csv_line()),
        format!("k {}-{}", generator.k_range().start(), generator.k_range().end()),
        format!("filtres : {}", describe_filters(&config.filters)),
        format!("classement : {}", scorer.names().join(", ")),
        format!("généré le {}", timestamp()),
    ];
    write_combinations(&args.output, &combinations, &header)?;
    println!("\n{} combinaisons écrites dans {}", combinations.len(), args.output.display());

    display_candidates(&ranked[..ranked.len().min(SUMMARY_TOP)]);

    if args.json {
        let json_path = args.output.with_extension("json");
        let summary = GenerationSummary {
            created_at: timestamp(),
            base: generator.base(),
            complement: generator.complement(),
            k_min: *generator.k_range().start(),
            k_max: *generator.k_range().end(),
            target_size: generator.target(),
            filters: config.filters.clone(),
            total_candidates: total,
            report,
            output: args.output.display().to_string(),
            top: ranked.iter().take(SUMMARY_TOP).cloned().collect(),
        };
        save_json(&summary, &json_path)?;
        println!("Résumé JSON : {}", json_path.display());
    }

    Ok(())
}

pub(crate) fn cmd_sample(conn: &Connection, args: &SampleArgs) -> Result<()> {
    let n = ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, args.window.min(n))?;

    let mut filters = FilterConfig::default();
    args.filters.apply(&mut filters)?;
    let reference = resolve_reference(conn, &filters, args.filters.reference)?;
    let chain = FilterChain::from_config(&filters, reference)?;

    let seed = args.seed.unwrap_or_else(|| {
        let ds = date_seed();
        println!("(Seed du jour : {ds})");
        ds
    });

    let table = FrequencyTable::from_draws(&draws);
    let outcome = sample_combinations(&table.weights(), args.size, args.count, &chain, seed)?;
    if !outcome.is_complete(args.count) {
        println!(
            "Seulement {} combinaisons trouvées sur {} demandées ({} tentatives).",
            outcome.combinations.len(),
            args.count,
            outcome.attempts
        );
    }

    let scorer = ScoringConfig::default().build(&draws)?;
    let ranked = rank_candidates(outcome.combinations.iter().copied(), &scorer, None);
    display_candidates(&ranked);

    if let Some(output) = &args.output {
        let header = vec![
            format!("Lotofácil : {} combinaisons aléatoires pondérées", outcome.combinations.len()),
            format!("fenêtre {} | seed {}", draws.len(), seed),
            format!("filtres : {}", describe_filters(&filters)),
        ];
        write_combinations(output, &outcome.combinations, &header)?;
        println!("Écrit dans {}", output.display());
    }
    Ok(())
}

pub(crate) fn cmd_reduce(args: &ReduceArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?.reducer;
    if let Some(v) = args.min_keep {
        config.min_keep = v;
    }
    if let Some(v) = args.max_keep {
        config.max_keep = v;
    }
    if let Some(v) = args.similarity {
        config.similarity = v;
    }
    if let Some(v) = args.min_distance {
        config.min_distance = v;
    }
    if args.limit.is_some() {
        config.limit = args.limit;
    }

    let read = read_combinations(&args.input)
        .with_context(|| format!("Lecture de {:?}", args.input))?;
    if read.skipped > 0 {
        println!("{} lignes invalides ignorées.", read.skipped);
    }

    let reduction = reduce(&read.combinations, &config)?;
    let header = vec![
        format!(
            "Réduction : {} bases, {} groupes, {} variations, {} retenues",
            reduction.bases,
            reduction.clusters,
            reduction.generated,
            reduction.combinations.len()
        ),
        format!(
            "garder {}-{} | similarité {} | distance ≥ {}",
            config.min_keep, config.max_keep, config.similarity, config.min_distance
        ),
        format!("source {}", args.input.display()),
    ];
    write_combinations(&args.output, &reduction.combinations, &header)?;

    println!("Bases lues          : {}", reduction.bases);
    println!("Groupes similaires  : {}", reduction.clusters);
    println!("Variations générées : {}", reduction.generated);
    println!("Retenues            : {}", reduction.combinations.len());
    println!("Écrit dans {}", args.output.display());
    Ok(())
}

pub(crate) fn cmd_backtest(conn: &Connection, args: &BacktestArgs) -> Result<()> {
    let n = ensure_draws(conn)?;
    let prizes = load_config(args.config.as_deref())?.prizes;
    let read = read_combinations(&args.input)
        .with_context(|| format!("Lecture de {:?}", args.input))?;
    if read.skipped > 0 {
        println!("{} lignes invalides ignorées.", read.skipped);
    }

    let draws = match args.before {
        Some(contest) => fetch_draws_before(conn, contest, args.last.min(n))?,
        None => fetch_last_draws(conn, args.last.min(n))?,
    };
    let report = backtest(&read.combinations, &draws, &prizes)?;
    display_backtest(&report, args.detail);

    if let Some(path) = &args.json {
        save_json(&report, path)?;
        println!("Rapport JSON : {}", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_coverage(conn: &Connection, args: &PoolArgs, tests: usize) -> Result<()> {
    ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, (tests + args.history()) as u32)?;
    let report = pool_coverage(&draws, &args.params(), tests)?;
    println!("Stratégie {} (base {})", args.strategy, args.base_size);
    display_coverage(&report);
    Ok(())
}

pub(crate) fn cmd_analyze(conn: &Connection, numbers: &str, last: u32) -> Result<()> {
    let set = parse_number_list(numbers)?;
    if !(DRAW_SIZE..=MAX_BET_SIZE).contains(&set.len()) {
        bail!(
            "Une combinaison compte {} à {} numéros ({} donnés)",
            DRAW_SIZE,
            MAX_BET_SIZE,
            set.len()
        );
    }
    display_features(set, &Features::of(set));

    let draws: Vec<Draw> = fetch_last_draws(conn, last)?;
    if draws.is_empty() {
        println!("Base vide : pas de confrontation aux tirages.");
    } else {
        display_hits(set, &draws);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "lotofacil", "--db", "/tmp/x.db", "generate", "-b", "1-20", "-k", "13",
            "--sum", "170-210", "--core", "1-12", "--core-min", "10", "--json",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.base.as_deref(), Some("1-20"));
                assert_eq!(args.k, Some(13));
                assert_eq!(args.filters.sum, Some(Bounds::new(170, 210)));
                assert_eq!(args.output, PathBuf::from("combinaisons.txt"));
                assert!(args.json);
            }
            _ => panic!("sous-commande inattendue"),
        }
    }

    #[test]
    fn test_core_requires_minimum() {
        assert!(Cli::try_parse_from(["lotofacil", "generate", "--core", "1-12"]).is_err());
        assert!(Cli::try_parse_from(["lotofacil", "generate", "--sum", "abc"]).is_err());
    }

    #[test]
    fn test_reference_requires_overlap() {
        assert!(Cli::try_parse_from(["lotofacil", "generate", "--reference", "3613"]).is_err());
        assert!(Cli::try_parse_from(["lotofacil", "sample", "--reference", "3613"]).is_err());

        let cli = Cli::try_parse_from(["lotofacil", "generate", "--overlap", "8-10", "--reference", "3613"]).unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.filters.overlap, Some(Bounds::new(8, 10)));
                assert_eq!(args.filters.reference, Some(3613));
            }
            _ => panic!("sous-commande inattendue"),
        }
    }

    #[test]
    fn test_parse_positional_flags() {
        let cli = Cli::try_parse_from(["lotofacil", "positional", "--heatmap", "-r", "10"]).unwrap();
        match cli.command {
            Command::Positional { last, heatmap, recent } => {
                assert_eq!(last, 100);
                assert!(heatmap);
                assert_eq!(recent, Some(10));
            }
            _ => panic!("sous-commande inattendue"),
        }
    }

    #[test]
    fn test_filter_args_override_config() {
        let mut config = FilterConfig {
            sum: Some(Bounds::new(100, 300)),
            evens: Some(Bounds::new(5, 10)),
            core: Some(CoreFilter { numbers: vec![1, 2, 3, 4], minimum: 2 }),
            ..FilterConfig::default()
        };
        let args = FilterArgs {
            sum: Some(Bounds::new(170, 210)),
            core_min: Some(3),
            ..FilterArgs::default()
        };
        args.apply(&mut config).unwrap();
        assert_eq!(config.sum, Some(Bounds::new(170, 210)));
        assert_eq!(config.evens, Some(Bounds::new(5, 10)));
        assert_eq!(config.core.as_ref().unwrap().minimum, 3);

        let orphan = FilterArgs { core_min: Some(3), ..FilterArgs::default() };
        assert!(orphan.apply(&mut FilterConfig::default()).is_err());
    }

    #[test]
    fn test_progress_follows_rejected_candidates() {
        let generator = ComplementaryGenerator::new(NumberSet::range(1, 20), NumberSet::range(21, 25), 13..=13, 15).unwrap();
        let impossible = FilterConfig { sum: Some(Bounds::new(0, 100)), ..FilterConfig::default() };
        let chain = FilterChain::from_config(&impossible, None).unwrap();

        let pb = ProgressBar::hidden();
        pb.set_length(generator.total_candidates());
        let (accepted, report) = enumerate_with_progress(&generator, &chain, None, &pb);
        assert!(accepted.is_empty());
        assert_eq!(report.enumerated, 775_200);
        assert_eq!(pb.position(), 775_200);
    }

    #[test]
    fn test_progress_stops_at_limit() {
        let generator = ComplementaryGenerator::new(NumberSet::range(1, 20), NumberSet::range(21, 25), 13..=13, 15).unwrap();
        let pb = ProgressBar::hidden();
        let (accepted, report) = enumerate_with_progress(&generator, &FilterChain::accept_all(), Some(5), &pb);
        assert_eq!(accepted.len(), 5);
        assert_eq!(report.enumerated, 5);
        assert_eq!(pb.position(), 5);
    }

    #[test]
    fn test_describe_filters() {
        assert_eq!(describe_filters(&FilterConfig::default()), "aucun");
        let config = FilterConfig {
            sum: Some(Bounds::new(170, 210)),
            max_run: Some(6),
            ..FilterConfig::default()
        };
        assert_eq!(describe_filters(&config), "somme 170-210, suite ≤ 6");
    }

    #[test]
    fn test_resolve_reference_uses_last_contest() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let config = FilterConfig { overlap: Some(Bounds::new(8, 10)), ..FilterConfig::default() };
        assert!(resolve_reference(&conn, &config, None).is_err());

        let numbers = [1, 3, 4, 7, 9, 10, 11, 12, 15, 16, 18, 20, 21, 22, 23];
        lotofacil_db::db::insert_draw(&conn, &Draw { contest: 3613, date: "2026-01-20".into(), numbers }).unwrap();
        let reference = resolve_reference(&conn, &config, None).unwrap().unwrap();
        assert_eq!(reference, NumberSet::from_numbers(&numbers).unwrap());
        assert!(resolve_reference(&conn, &config, Some(1)).is_err());
        assert_eq!(resolve_reference(&conn, &FilterConfig::default(), None).unwrap(), None);
    }
}
