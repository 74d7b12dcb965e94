use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use lotofacil_db::models::{Draw, FrequencyTag, NumberSet, DRAW_SIZE, MAX_NUMBER};
use lotofacil_engine::backtest::{BacktestReport, CoverageReport, MIN_PRIZE_HITS};
use lotofacil_engine::features::Features;
use lotofacil_engine::generator::GenerationReport;
use lotofacil_engine::pools::PoolSplit;
use lotofacil_engine::positional::{PositionSummary, PositionalDebit, PositionalTable};
use lotofacil_engine::scoring::Candidate;
use lotofacil_engine::stats::{DebitEntry, DebitStatus, NumberStats};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: impl IntoIterator<Item = u8>) -> String {
    numbers
        .into_iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Date", "Numéros", "Somme", "Pairs"]);
    for draw in draws {
        let set = draw.set();
        table.add_row(vec![
            draw.contest.to_string(),
            draw.date.clone(),
            format_numbers(draw.sorted_numbers()),
            set.sum().to_string(),
            lotofacil_engine::features::count_evens(set).to_string(),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn tag_cell(tag: FrequencyTag) -> Cell {
    match tag {
        FrequencyTag::Hot => Cell::new(tag.to_string()).fg(Color::Red),
        FrequencyTag::Cold => Cell::new(tag.to_string()).fg(Color::Blue),
        FrequencyTag::Normal => Cell::new(tag.to_string()),
    }
}

pub fn display_stats(stats: &[NumberStats], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    let mut table = new_table(vec!["Numéro", "Fréquence", "%", "Retard", "Tendance"]);
    for stat in &sorted {
        let pct = if window > 0 {
            stat.frequency as f64 / window as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", stat.number)),
            Cell::new(stat.frequency),
            Cell::new(format!("{:.1}", pct)),
            Cell::new(stat.gap),
            tag_cell(stat.tag),
        ]);
    }
    println!("{table}");
}

fn status_cell(status: DebitStatus) -> Cell {
    let cell = Cell::new(status.to_string());
    match status {
        DebitStatus::HighSurplus | DebitStatus::Surplus => cell.fg(Color::Red),
        DebitStatus::HighDebit => cell.fg(Color::Green),
        _ => cell,
    }
}

pub fn display_debit(entries: &[DebitEntry], short: usize, long: usize) {
    println!("\n⚖️  Indice de débit (court {} / long {} tirages)\n", short, long);

    let mut table = new_table(vec!["Rang", "Numéro", "Court %", "Long %", "Indice", "Statut", "Score excl."]);
    for (rank, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:02}", entry.number)),
            Cell::new(format!("{:.1}", entry.short_pct)),
            Cell::new(format!("{:.1}", entry.long_pct)),
            Cell::new(format!("{:+.1}", entry.index)),
            status_cell(entry.status),
            Cell::new(entry.score),
        ]);
    }
    println!("{table}");
}

fn format_pair(pair: Option<(u8, u8)>) -> String {
    match pair {
        Some((lo, hi)) => format!("{:02}-{:02}", lo, hi),
        None => "-".to_string(),
    }
}

/// Trois valeurs les plus fréquentes : `07 (42.0%)`.
fn format_top(top: &[(u8, u32)], window: usize) -> String {
    top.iter()
        .take(3)
        .map(|&(n, count)| format!("{:02} ({:.1}%)", n, count as f64 * 100.0 / window.max(1) as f64))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn display_positional(summary: &[PositionSummary], window: usize) {
    println!("\n📍 Analyse positionnelle sur les {} derniers tirages\n", window);

    let mut table = new_table(vec!["Position", "Min-Max", "P10-P90", "Dernier", "Répét.", "Plus fréquents"]);
    for s in summary {
        let streak = Cell::new(s.streak);
        table.add_row(vec![
            Cell::new(format!("N{}", s.position)),
            Cell::new(format_pair(s.bounds)),
            Cell::new(format_pair(s.amplitude)),
            Cell::new(s.latest.map_or("-".to_string(), |n| format!("{:02}", n))),
            if s.streak >= 3 { streak.fg(Color::Red) } else { streak },
            Cell::new(format_top(&s.top, window)),
        ]);
    }
    println!("{table}");
}

/// Carte de chaleur : une ligne par position, une colonne par numéro.
pub fn display_heatmap(positional: &PositionalTable) {
    let mut header = vec!["Pos".to_string()];
    header.extend((1..=MAX_NUMBER).map(|n| format!("{:02}", n)));
    let mut table = new_table(header.iter().map(String::as_str).collect());

    for position in 1..=DRAW_SIZE {
        let max = (1..=MAX_NUMBER).map(|n| positional.count(position, n)).max().unwrap_or(0);
        let mut row = vec![Cell::new(format!("N{}", position))];
        for n in 1..=MAX_NUMBER {
            let count = positional.count(position, n);
            let cell = if count == 0 { Cell::new("") } else { Cell::new(count) };
            row.push(match count {
                0 => cell,
                c if c * 2 >= max => cell.fg(Color::Red),
                c if c * 4 >= max => cell.fg(Color::Yellow),
                _ => cell.fg(Color::Blue),
            });
        }
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_positional_debits(debits: &[PositionalDebit], recent: usize, history: usize) {
    println!(
        "\n⚖️  Débits positionnels ({} derniers tirages contre les {} précédents)\n",
        recent, history
    );
    if debits.is_empty() {
        println!("Aucun numéro en débit de position.");
        return;
    }

    let mut table = new_table(vec!["Numéro", "Position", "Historique %", "Récent %", "Déficit"]);
    for d in debits {
        table.add_row(vec![
            Cell::new(format!("{:02}", d.number)),
            Cell::new(format!("N{}", d.position)),
            Cell::new(format!("{:.1}", d.historical_pct)),
            Cell::new(format!("{:.1}", d.recent_pct)),
            Cell::new(format!("{:.1}", d.deficit)).fg(Color::Green),
        ]);
    }
    println!("{table}");
}

pub fn display_pools(split: &PoolSplit) {
    let mut table = new_table(vec!["Pool", "Taille", "Numéros"]);
    let rows = [
        ("Base", split.base, Color::Green),
        ("Complément", split.complement, Color::White),
        ("Exclus", split.excluded, Color::Red),
    ];
    for (label, set, color) in rows {
        table.add_row(vec![
            Cell::new(label).fg(color),
            Cell::new(set.len()),
            Cell::new(format_numbers(set.iter())),
        ]);
    }
    println!("{table}");
    println!(
        "  → lotofacil generate --base {} --complement {}",
        join_csv(split.base),
        join_csv(split.complement)
    );
}

fn join_csv(set: NumberSet) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.to_csv_line()
    }
}

pub fn display_candidates(candidates: &[Candidate]) {
    if candidates.is_empty() {
        return;
    }
    let mut table = new_table(vec!["#", "Combinaison", "Somme", "Pairs", "Score"]);
    for (i, c) in candidates.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_numbers(c.numbers.iter())),
            Cell::new(c.numbers.sum()),
            Cell::new(lotofacil_engine::features::count_evens(c.numbers)),
            Cell::new(format!("{:.4}", c.score)),
        ]);
    }
    println!("{table}");
}

pub fn display_generation_report(report: &GenerationReport, total: u64) {
    println!("\nGénération :");
    println!("  Candidats théoriques : {}", total);
    println!("  Énumérés             : {}", report.enumerated);
    if report.short_unions > 0 {
        println!("  Unions trop courtes  : {}", report.short_unions);
    }
    if report.duplicates > 0 {
        println!("  Doublons             : {}", report.duplicates);
    }
    println!("  Rejetés              : {}", report.rejected_total());
    for (kind, count) in &report.rejected_by {
        println!("    - {:<12} {}", kind.to_string(), count);
    }
    println!("  Retenus              : {}", report.accepted);
}

pub fn display_backtest(report: &BacktestReport, detail: usize) {
    println!(
        "\n🎯 Backtest : {} combinaisons sur {} tirages\n",
        report.combinations, report.draws
    );

    let mut table = new_table(vec!["Points", "Occurrences"]);
    for hits in (MIN_PRIZE_HITS.saturating_sub(2)..report.histogram.len()).rev() {
        let count = report.histogram[hits];
        let cell = Cell::new(format!("{hits}"));
        let cell = if hits >= MIN_PRIZE_HITS && count > 0 {
            cell.fg(Color::Green)
        } else {
            cell
        };
        table.add_row(vec![cell, Cell::new(count)]);
    }
    println!("{table}");

    if detail > 0 && !report.per_draw.is_empty() {
        let mut table = new_table(vec!["Concours", "Meilleur", "Gagnantes", "Gains"]);
        for outcome in report.per_draw.iter().take(detail) {
            table.add_row(vec![
                Cell::new(outcome.contest),
                Cell::new(outcome.best_hits),
                Cell::new(outcome.winners),
                Cell::new(format!("{:.2}", outcome.winnings)),
            ]);
        }
        println!("{table}");
    }

    println!("  Meilleur score   : {} points", report.best_hits);
    println!("  Combinaisons primées : {}", report.prize_count());
    println!("  Coût total       : R$ {:.2}", report.total_cost);
    println!("  Gains totaux     : R$ {:.2}", report.total_winnings);
    println!("  ROI              : {:+.1} %", report.roi);
}

pub fn display_coverage(report: &CoverageReport) {
    println!("\n🔎 Couverture walk-forward sur {} tirages\n", report.outcomes.len());

    let mut table = new_table(vec!["Concours", "Base", "Complément", "Exclus"]);
    for outcome in &report.outcomes {
        let excluded = Cell::new(outcome.excluded_hits);
        let excluded = if outcome.excluded_hits == 0 {
            excluded.fg(Color::Green)
        } else {
            excluded
        };
        table.add_row(vec![
            Cell::new(outcome.contest),
            Cell::new(outcome.base_hits),
            Cell::new(outcome.complement_hits),
            excluded,
        ]);
    }
    println!("{table}");

    println!("  Moyenne base       : {:.2}", report.mean_base);
    println!("  Moyenne complément : {:.2}", report.mean_complement);
    println!("  Moyenne exclus     : {:.2}", report.mean_excluded);
    println!(
        "  Exclusions parfaites : {}/{}",
        report.clean_exclusions,
        report.outcomes.len()
    );
}

pub fn display_features(set: NumberSet, features: &Features) {
    println!("\nCombinaison : {}", format_numbers(set.iter()));

    let mut table = new_table(vec!["Caractéristique", "Valeur"]);
    let row = |v: &[u8; 5]| v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join("-");
    table.add_row(vec!["Taille".to_string(), features.size.to_string()]);
    table.add_row(vec!["Somme".to_string(), features.sum.to_string()]);
    table.add_row(vec![
        "Pairs / Impairs".to_string(),
        format!("{} / {}", features.evens, features.odds),
    ]);
    table.add_row(vec!["Premiers".to_string(), features.primes.to_string()]);
    table.add_row(vec!["Fibonacci".to_string(), features.fibonacci.to_string()]);
    table.add_row(vec!["Plus longue suite".to_string(), features.max_run.to_string()]);
    table.add_row(vec!["Lignes".to_string(), row(&features.rows)]);
    table.add_row(vec!["Colonnes".to_string(), row(&features.columns)]);
    println!("{table}");
}

pub fn display_hits(set: NumberSet, draws: &[Draw]) {
    if draws.is_empty() {
        return;
    }
    let mut table = new_table(vec!["Concours", "Date", "Points", "Numéros communs"]);
    for draw in draws {
        let common = set.intersection(draw.set());
        let points = Cell::new(common.len());
        let points = if common.len() >= MIN_PRIZE_HITS {
            points.fg(Color::Green)
        } else {
            points
        };
        table.add_row(vec![
            Cell::new(draw.contest),
            Cell::new(&draw.date),
            points,
            Cell::new(format_numbers(common.iter())),
        ]);
    }
    println!("{table}");
}
