use std::collections::HashMap;

use attrscript_core::lang::builtins;
use attrscript_core::lang::keywords;
use attrscript_core::lang::operators;
use attrscript_core::lang::punctuation;

#[test]
fn keywords_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, keywords::KeywordId> = HashMap::new();

    for (pos, info) in keywords::KEYWORDS.iter().enumerate() {
        assert_eq!(info.id as usize, pos, "keyword table out of order at {:?}", info.id);
        assert_eq!(
            keywords::from_str(info.canonical),
            Some(info.id),
            "keyword canonical spelling not resolvable: {}",
            info.canonical
        );
        assert_eq!(keywords::as_str(info.id), info.canonical);

        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!(
                "duplicate keyword spelling {:?}: {:?} and {:?}",
                info.canonical, prev, info.id
            );
        }
    }
}

#[test]
fn operators_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, operators::OperatorId> = HashMap::new();

    for (pos, info) in operators::OPERATORS.iter().enumerate() {
        assert_eq!(info.id as usize, pos, "operator table out of order at {:?}", info.id);
        assert_eq!(operators::from_str(info.spelling), Some(info.id));
        if let Some(prev) = seen.insert(info.spelling, info.id) {
            panic!("duplicate operator spelling {:?}: {:?} and {:?}", info.spelling, prev, info.id);
        }
    }
}

#[test]
fn word_operators_are_reserved_keywords() {
    for info in operators::OPERATORS.iter().filter(|o| o.is_keyword_spelling) {
        assert!(
            keywords::from_str(info.spelling).is_some(),
            "word operator {:?} is not a reserved keyword",
            info.spelling
        );
    }
}

#[test]
fn punctuation_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, punctuation::PunctuationId> = HashMap::new();

    for (pos, info) in punctuation::PUNCTUATION.iter().enumerate() {
        assert_eq!(info.id as usize, pos, "punctuation table out of order at {:?}", info.id);
        assert_eq!(punctuation::from_str(info.canonical), Some(info.id));
        assert!(
            operators::from_str(info.canonical).is_none(),
            "punctuation {:?} collides with an operator",
            info.canonical
        );
        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!("duplicate punctuation {:?}: {:?} and {:?}", info.canonical, prev, info.id);
        }
    }
}

#[test]
fn builtins_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, builtins::BuiltinFnId> = HashMap::new();

    for (pos, info) in builtins::BUILTIN_FUNCTIONS.iter().enumerate() {
        assert_eq!(info.id as usize, pos, "builtin table out of order at {:?}", info.id);
        assert_eq!(builtins::from_str(info.canonical), Some(info.id));
        assert!(
            keywords::from_str(info.canonical).is_none(),
            "builtin {:?} shadows a keyword",
            info.canonical
        );
        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!("duplicate builtin {:?}: {:?} and {:?}", info.canonical, prev, info.id);
        }
    }
}

#[test]
fn augmented_operators_map_to_arithmetic() {
    use operators::OperatorId;
    assert_eq!(operators::augmented_base(OperatorId::PlusEq), Some(OperatorId::Plus));
    assert_eq!(operators::augmented_base(OperatorId::SlashSlashEq), Some(OperatorId::SlashSlash));
    assert_eq!(operators::augmented_base(OperatorId::Plus), None);
}
