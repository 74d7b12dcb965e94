use lotofacil_db::models::NumberSet;

/// C(n, k), 0 si k > n.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u64 = 1;
    for i in 0..k {
        acc = acc * (n - i) / (i + 1);
    }
    acc
}

/// Itérateur paresseux sur les k-sous-ensembles d'un pool, en ordre lexicographique
/// des positions (le pool est trié à la construction).
#[derive(Debug, Clone)]
pub struct Combinations {
    pool: Vec<u8>,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub fn new(pool: NumberSet, k: usize) -> Self {
        let pool = pool.to_vec();
        let done = k > pool.len();
        Self {
            indices: (0..k).collect(),
            pool,
            done,
        }
    }

    fn current(&self) -> NumberSet {
        self.indices.iter().map(|&i| self.pool[i]).collect()
    }

    fn advance(&mut self) {
        let k = self.indices.len();
        let n = self.pool.len();
        // Position la plus à droite qui peut encore avancer
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return;
            }
        }
        self.done = true;
    }
}

impl Iterator for Combinations {
    type Item = NumberSet;

    fn next(&mut self) -> Option<NumberSet> {
        if self.done {
            return None;
        }
        let item = self.current();
        self.advance();
        Some(item)
    }
}

pub fn combinations(pool: NumberSet, k: usize) -> Combinations {
    Combinations::new(pool, k)
}
