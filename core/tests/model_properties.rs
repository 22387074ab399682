use anomalia_core::suffix::endings;
use anomalia_core::{
    estimate_lambdas, estimate_lambdas_with, frame, is_sentinel, BigramDenominator, ChainGraph,
    Config, ModelError, Trainer, ORDER,
};

const CORPUS: &[(&str, &str)] = &[
    ("il gatto corre", "DET NOUN VERB"),
    ("il cane corre", "DET NOUN VERB"),
    ("la gatta dorme sul divano", "DET NOUN VERB PREP NOUN"),
    ("il cane dorme", "DET NOUN VERB"),
    ("oggi piove", "ADV VERB"),
];

fn trainer() -> Trainer {
    let mut t = Trainer::new();
    for (tokens, tags) in CORPUS {
        let tokens: Vec<&str> = tokens.split(' ').collect();
        let tags: Vec<&str> = tags.split(' ').collect();
        t.add_sentence(&tokens, &tags).unwrap();
    }
    t
}

#[test]
fn rare_tokens_are_covered_by_suffixes() {
    let model = trainer().freeze(&Config::default()).unwrap();
    let graph = model.tokens().graph();
    let suffixes = model.tokens().suffixes();
    for (_, token, root) in graph.roots() {
        if is_sentinel(token) {
            assert!(!suffixes.contains(token), "{} indexed", token);
            continue;
        }
        if root.freq < suffixes.threshold() {
            assert!(
                endings(token, suffixes.max_len()).any(|e| suffixes.contains(e)),
                "{} has no suffix entry",
                token
            );
        }
    }
}

#[test]
fn lambdas_are_normalized_or_zero() {
    let model = trainer().freeze(&Config::default()).unwrap();
    for lambdas in [model.tokens().lambdas(), model.tags().lambdas()] {
        let sum = lambdas.sum();
        assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9, "sum {}", sum);
    }
}

#[test]
fn configured_denominator_reaches_both_models() {
    let config = Config {
        bigram_denominator: BigramDenominator::RootFrequency,
        ..Config::default()
    };
    let model = trainer().freeze(&config).unwrap();
    for chain in [model.tokens(), model.tags()] {
        assert_eq!(
            chain.lambdas(),
            estimate_lambdas_with(chain.graph(), BigramDenominator::RootFrequency)
        );
    }
    let model = trainer().freeze(&Config::default()).unwrap();
    assert_eq!(model.tokens().lambdas(), estimate_lambdas(model.tokens().graph()));
}

#[test]
fn unknown_tokens_get_no_chain_probability() {
    let model = trainer().freeze(&Config::default()).unwrap();
    let positions = model.scorer().token_positions(&["xyz", "zzz", "qqq"]).unwrap();
    assert!(positions.iter().all(|p| p.token_chain == Some(0.0)));
}

#[test]
fn empty_phrase_is_rejected() {
    let model = trainer().freeze(&Config::default()).unwrap();
    assert_eq!(
        model.score_phrase::<&str, &str>(&[], &[]),
        Err(ModelError::PhraseTooShort { len: 0, min: 1 })
    );
}

#[test]
fn deleted_estimation_tie_awards_nothing() {
    // every trigram has equal bigram and trigram ratios
    let mut g = ChainGraph::new();
    for _ in 0..3 {
        g.add_sequence(&frame(&["sempre", "uguale"])).unwrap();
    }
    let l = estimate_lambdas(&g);
    assert_eq!(l.0, [0.0, 0.0, 0.0]);
}

#[test]
fn repeated_sentence_doubles_counts() {
    let mut once = ChainGraph::new();
    let mut twice = ChainGraph::new();
    let seq = frame(&["la", "gatta", "dorme"]);
    once.add_sequence(&seq).unwrap();
    twice.add_sequence(&seq).unwrap();
    twice.add_sequence(&seq).unwrap();
    for w in seq.windows(ORDER) {
        assert_eq!(twice.chain_count(w), 2 * once.chain_count(w));
        assert_eq!(twice.chain_count(&w[..2]), 2 * once.chain_count(&w[..2]));
    }
    for t in &seq {
        assert_eq!(twice.ordinal(t), once.ordinal(t));
    }
}

#[test]
fn scoring_is_repeatable() {
    let model = trainer().freeze(&Config::default()).unwrap();
    let tokens = ["il", "gatta", "piove"];
    let tags = ["DET", "NOUN", "VERB"];
    let a = model.score_phrase(&tokens, &tags).unwrap();
    let b = model.score_phrase(&tokens, &tags).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn too_short_sequences_fail_validation() {
    let model = trainer().freeze(&Config::default()).unwrap();
    assert_eq!(
        model.tokens().score_chain(&["il"]),
        Err(ModelError::PhraseTooShort { len: 1, min: ORDER - 1 })
    );
    assert!(model.tokens().score_gram(&["il", "gatto"]).is_err());
}

#[test]
fn mismatched_phrase_is_rejected() {
    let model = trainer().freeze(&Config::default()).unwrap();
    assert_eq!(
        model.score_phrase(&["il", "gatto"], &["DET"]),
        Err(ModelError::LengthMismatch { tokens: 2, tags: 1 })
    );
}
