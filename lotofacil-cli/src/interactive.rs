use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lotofacil_db::db::insert_draw;
use lotofacil_db::models::{Draw, DRAW_SIZE, validate_draw};
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::filters::Bounds;
use lotofacil_engine::pools::PoolStrategy;

use crate::import::parse_date;
use crate::{FilterArgs, GenerateArgs, PoolArgs, SampleArgs};

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Add,
    History,
    Stats,
    Debit,
    Pools,
    Generate,
    Sample,
    Analyze,
    Positional,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "ajouter" | "add" => Some(InteractiveCommand::Add),
        "2" | "historique" | "history" | "hist" => Some(InteractiveCommand::History),
        "3" | "stats" | "statistiques" => Some(InteractiveCommand::Stats),
        "4" | "debit" | "débit" | "debito" => Some(InteractiveCommand::Debit),
        "5" | "pools" | "pool" => Some(InteractiveCommand::Pools),
        "6" | "generer" | "générer" | "generate" | "gen" => Some(InteractiveCommand::Generate),
        "7" | "aleatoire" | "aléatoire" | "sample" => Some(InteractiveCommand::Sample),
        "8" | "analyser" | "analyze" | "ana" => Some(InteractiveCommand::Analyze),
        "9" | "positions" | "positionnel" | "pos" => Some(InteractiveCommand::Positional),
        "10" | "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu() {
    println!();
    println!("── Mode interactif ──");
    println!("  1. ajouter     Ajouter un tirage");
    println!("  2. historique  Derniers tirages");
    println!("  3. stats       Fréquences et retards");
    println!("  4. debit       Indice de débit");
    println!("  5. pools       Proposer base et complément");
    println!("  6. generer     Générer des combinaisons");
    println!("  7. aleatoire   Combinaisons aléatoires pondérées");
    println!("  8. analyser    Analyser une combinaison");
    println!("  9. positions   Analyse par position (N1-N15)");
    println!(" 10. quitter     Quitter");
    println!();
}

pub(crate) fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        bail!("Fin de l'entrée");
    }
    Ok(input.trim().to_string())
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}] : ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Réponse vide = option non utilisée.
fn prompt_optional(msg: &str) -> Result<Option<String>> {
    let input = prompt(&format!("{} (vide = aucun) : ", msg))?;
    Ok(if input.is_empty() { None } else { Some(input) })
}

fn prompt_bounds(msg: &str) -> Result<Option<Bounds>> {
    match prompt_optional(msg)? {
        Some(s) => Ok(Some(s.parse::<Bounds>()?)),
        None => Ok(None),
    }
}

fn parse_draw_numbers(input: &str) -> Option<[u8; DRAW_SIZE]> {
    let nums: Vec<u8> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let arr: [u8; DRAW_SIZE] = nums.try_into().ok()?;
    validate_draw(&arr).ok()?;
    Some(arr)
}

fn prompt_numbers() -> Result<[u8; DRAW_SIZE]> {
    loop {
        let input = prompt("15 numéros (séparés par des espaces, 1-25) : ")?;
        match parse_draw_numbers(&input) {
            Some(arr) => return Ok(arr),
            None => println!("Entrez exactement 15 numéros distincts entre 1 et 25. Réessayez."),
        }
    }
}

pub(crate) fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let raw_contest = prompt("Numéro du concours (ex: 3614) : ")?;
    let contest: u32 = raw_contest
        .parse()
        .with_context(|| format!("Numéro de concours invalide : '{}'", raw_contest))?;
    let date = parse_date(&prompt("Date (JJ/MM/AAAA) : ")?)?;
    let numbers = prompt_numbers()?;

    let draw = Draw { contest, date, numbers };

    println!("\nTirage à insérer :");
    println!(
        "  Concours {} du {} : {}",
        draw.contest,
        draw.date,
        draw.set()
    );

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.to_lowercase() == "o" {
        let inserted = insert_draw(conn, &draw)?;
        if inserted {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn cmd_history_interactive(conn: &Connection) -> Result<()> {
    let n: u32 = prompt_with_default("Nombre de tirages", "10")?
        .parse()
        .context("Nombre invalide")?;
    super::cmd_list(conn, n)
}

fn cmd_stats_interactive(conn: &Connection) -> Result<()> {
    let window: u32 = prompt_with_default("Fenêtre d'analyse", "50")?
        .parse()
        .context("Nombre invalide")?;
    super::cmd_stats(conn, window)
}

fn cmd_debit_interactive(conn: &Connection) -> Result<()> {
    let short: usize = prompt_with_default("Fenêtre courte", "5")?
        .parse()
        .context("Nombre invalide")?;
    let long: usize = prompt_with_default("Fenêtre longue", "50")?
        .parse()
        .context("Nombre invalide")?;
    super::cmd_debit(conn, short, long)
}

fn cmd_positional_interactive(conn: &Connection) -> Result<()> {
    let last: u32 = prompt_with_default("Fenêtre d'analyse", "100")?
        .parse()
        .context("Nombre invalide")?;
    let recent: Option<usize> = prompt_optional("Fenêtre récente pour les débits")?
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("Nombre invalide")?;
    super::cmd_positional(conn, last, false, recent)
}

fn cmd_pools_interactive(conn: &Connection) -> Result<()> {
    let strategy: PoolStrategy = prompt_with_default("Stratégie (frequency, debit)", "frequency")?.parse()?;
    let base_size: usize = prompt_with_default("Taille de la base", "20")?
        .parse()
        .context("Nombre invalide")?;
    let args = PoolArgs {
        strategy,
        base_size,
        window: if strategy == PoolStrategy::Debit { 5 } else { 50 },
        long_window: 50,
        exclude: 2,
    };
    super::cmd_pools(conn, &args)
}

fn cmd_generate_interactive(conn: &Connection) -> Result<()> {
    let base = prompt_with_default("Pool de base", "1-20")?;
    let complement = prompt_optional("Complément (défaut : le reste)")?;
    let k: usize = prompt_with_default("Numéros pris dans la base", "13")?
        .parse()
        .context("Nombre invalide")?;
    let sum = prompt_bounds("Somme min-max")?;
    let evens = prompt_bounds("Pairs min-max")?;
    let overlap = prompt_bounds("Répétés du dernier concours min-max")?;
    let output = prompt_with_default("Fichier de sortie", "combinaisons.txt")?;

    let args = GenerateArgs {
        base: Some(base),
        complement,
        k: Some(k),
        filters: FilterArgs {
            sum,
            evens,
            overlap,
            ..FilterArgs::default()
        },
        output: PathBuf::from(output),
        json: true,
        ..GenerateArgs::default()
    };
    super::cmd_generate(conn, &args)
}

fn cmd_sample_interactive(conn: &Connection) -> Result<()> {
    let count: usize = prompt_with_default("Nombre de combinaisons", "10")?
        .parse()
        .context("Nombre invalide")?;
    let sum = prompt_bounds("Somme min-max")?;
    let args = SampleArgs {
        count,
        size: DRAW_SIZE,
        window: 50,
        filters: FilterArgs { sum, ..FilterArgs::default() },
        ..SampleArgs::default()
    };
    super::cmd_sample(conn, &args)
}

fn cmd_analyze_interactive(conn: &Connection) -> Result<()> {
    let numbers = prompt("Combinaison (ex: 1,2,3,... ou 1-10,12,15-18) : ")?;
    super::cmd_analyze(conn, &numbers, 10)
}

pub(crate) fn run_interactive(conn: &Connection) -> Result<()> {
    println!("Bienvenue dans le mode interactif de lotofacil !");

    loop {
        display_menu();
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break,
        };

        if input.is_empty() {
            continue;
        }

        let result = match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Add) => cmd_add(conn),
            Some(InteractiveCommand::History) => cmd_history_interactive(conn),
            Some(InteractiveCommand::Stats) => cmd_stats_interactive(conn),
            Some(InteractiveCommand::Debit) => cmd_debit_interactive(conn),
            Some(InteractiveCommand::Pools) => cmd_pools_interactive(conn),
            Some(InteractiveCommand::Generate) => cmd_generate_interactive(conn),
            Some(InteractiveCommand::Sample) => cmd_sample_interactive(conn),
            Some(InteractiveCommand::Analyze) => cmd_analyze_interactive(conn),
            Some(InteractiveCommand::Positional) => cmd_positional_interactive(conn),
            None => {
                println!("Commande inconnue : '{}'. Tapez un numéro (1-9) ou un nom de commande.", input);
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("Erreur: {e:#}");
        }
    }

    Ok(())
}
