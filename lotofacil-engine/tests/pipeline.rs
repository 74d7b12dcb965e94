use lotofacil_db::models::NumberSet;
use lotofacil_engine::filters::{Bounds, CoreFilter, FilterChain, FilterConfig, FilterKind};
use lotofacil_engine::generator::ComplementaryGenerator;
use lotofacil_engine::persistence::{read_combinations, write_combinations};
use lotofacil_engine::scoring::{rank_candidates, BalanceScorer};

fn set(numbers: &[u8]) -> NumberSet {
    NumberSet::from_numbers(numbers).unwrap()
}

fn standard_config() -> FilterConfig {
    FilterConfig {
        sum: Some(Bounds::new(170, 210)),
        core: Some(CoreFilter { numbers: (1..=12).collect(), minimum: 10 }),
        ..Default::default()
    }
}

#[test]
fn base_20_complement_5_k13_with_sum_and_core() {
    let base = NumberSet::range(1, 20);
    let complement = NumberSet::range(21, 25);
    let gen = ComplementaryGenerator::new(base, complement, 13..=13, 15).unwrap();
    let chain = FilterChain::from_config(&standard_config(), None).unwrap();

    let (accepted, report) = gen.generate(&chain, None);

    assert_eq!(report.enumerated, 775_200);
    assert_eq!(report.accepted + report.rejected_total(), report.enumerated);
    assert!(!accepted.is_empty());

    let core = NumberSet::range(1, 12);
    for c in &accepted {
        assert_eq!(c.len(), 15);
        assert_eq!(c.overlap(base), 13);
        assert_eq!(c.overlap(complement), 2);
        assert!((170..=210).contains(&c.sum()));
        assert!(c.overlap(core) >= 10);
    }

    // somme 75 + 57 + 49 = 181, 10 numéros du noyau
    let kept = set(&[3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 18, 19, 20, 24, 25]);
    assert!(accepted.contains(&kept));

    // somme 134 : rejeté par la somme
    let low_sum = set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 21, 22]);
    assert_eq!(chain.check(low_sum), Err(FilterKind::Sum));
    assert!(!accepted.contains(&low_sum));

    // somme 175 mais 8 numéros du noyau
    let weak_core = set(&[1, 2, 3, 4, 5, 6, 7, 8, 16, 17, 18, 19, 20, 24, 25]);
    assert_eq!(chain.check(weak_core), Err(FilterKind::Core));
    assert!(!accepted.contains(&weak_core));

    assert!(report.rejected_by[&FilterKind::Sum] > 0);
    assert!(report.rejected_by[&FilterKind::Core] > 0);
}

#[test]
fn generated_file_round_trip_and_ranking() {
    let gen = ComplementaryGenerator::new(NumberSet::range(1, 20), NumberSet::range(21, 25), 13..=13, 15).unwrap();
    let chain = FilterChain::from_config(&standard_config(), None).unwrap();
    let (accepted, _) = gen.generate(&chain, Some(50));

    let ranked = rank_candidates(accepted.iter().copied(), &BalanceScorer::default(), Some(10));
    assert_eq!(ranked.len(), 10.min(accepted.len()));
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lotofacil_k13.txt");
    let header = vec![format!("{} combinaisons", accepted.len())];
    write_combinations(&path, &accepted, &header).unwrap();

    let read = read_combinations(&path).unwrap();
    assert_eq!(read.skipped, 0);
    assert_eq!(read.combinations, accepted);
}

#[test]
fn impossible_filters_give_empty_output_with_header() {
    let gen = ComplementaryGenerator::new(NumberSet::range(1, 20), NumberSet::range(21, 25), 13..=13, 15).unwrap();
    let cfg = FilterConfig { sum: Some(Bounds::new(0, 100)), ..Default::default() };
    let chain = FilterChain::from_config(&cfg, None).unwrap();
    let (accepted, report) = gen.generate(&chain, None);
    assert!(accepted.is_empty());
    assert_eq!(report.rejected_by[&FilterKind::Sum], report.enumerated);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vide.txt");
    write_combinations(&path, &accepted, &["0 combinaisons".to_string()]).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().starts_with("# 0 combinaisons"));
}
