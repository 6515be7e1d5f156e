use super::*;
use crate::errors::EvalErrorKind;
use pretty_assertions::assert_eq;

fn call(kind: AffixKind, args: FunctionArgs) -> Result<Expr, ArgumentError> {
    kind.construct(args, Location::inline(1, 1))
}

fn startswith(haystack: Expr, needle: Expr) -> FunctionArgs {
    FunctionArgs::new(vec![haystack, needle])
}

fn eval_with(expr: &Expr, record: &Record) -> EvalResult {
    expr.eval(&EvalContext::new(record))
}

fn eval(expr: &Expr) -> EvalResult {
    eval_with(expr, &Record::new())
}

// Comparator

#[test]
fn prefix_and_suffix_comparators() {
    assert!(AffixKind::Prefix.matches("filename.log", "file"));
    assert!(!AffixKind::Prefix.matches("filename.log", ".log"));
    assert!(AffixKind::Suffix.matches("filename.log", ".log"));
    assert!(!AffixKind::Suffix.matches("filename.log", "file"));
}

#[test]
fn empty_needle_matches_even_empty_haystack() {
    assert!(AffixKind::Prefix.matches("", ""));
    assert!(AffixKind::Suffix.matches("", ""));
    assert!(AffixKind::Suffix.matches("abc", ""));
}

#[test]
fn longer_needle_never_matches() {
    assert!(!AffixKind::Suffix.matches("log", "filename.log"));
    assert!(!AffixKind::Prefix.matches("file", "filename"));
}

#[test]
fn suffix_compares_every_trailing_byte() {
    assert!(!AffixKind::Suffix.matches("filename.log", ".txt"));
    assert!(!AffixKind::Suffix.matches("abc", "xbc"));
}

#[test]
fn fold_case_uses_full_unicode_mapping() {
    assert_eq!(fold_case("HeLLo"), "hello");
    assert_eq!(fold_case("ÉCOLE"), "école");
    assert_eq!(fold_case("İ"), "i\u{307}");
    assert_eq!(fold_case("İ").len(), 3);
}

#[test]
fn fold_case_expands_sharp_s_and_unifies_sigma() {
    assert_eq!(fold_case("straß"), "strasse");
    assert_eq!(fold_case("STRASSE"), "strasse");
    assert_eq!(fold_case("οδος"), fold_case("ΟΔΟΣ"));
    assert_eq!(fold_case("ς"), "σ");
}

#[test]
fn ignorecase_prefix_matches_sharp_s() {
    let args = startswith(Expr::literal("STRASSE"), Expr::literal("straß"))
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Prefix, args).unwrap();
    assert_eq!(expr.as_affix().unwrap().literal_needles(), ["strasse".to_string()]);
    assert_eq!(eval(&expr).unwrap(), Value::Bool(true));
}

#[test]
fn ignorecase_suffix_matches_final_sigma() {
    let args = FunctionArgs::new(vec![Expr::variable("word"), Expr::literal("οδος")])
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Suffix, args).unwrap();
    let record = Record::new().with("word", "ΟΔΟΣ");
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));
}

// Evaluation

#[test]
fn ignorecase_prefix() {
    let args = startswith(Expr::literal("Hello"), Expr::literal("he"))
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Prefix, args).unwrap();
    assert_eq!(eval(&expr).unwrap(), Value::Bool(true));
}

#[test]
fn case_sensitive_by_default() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::literal("Hello"), Expr::literal("he")),
    )
    .unwrap();
    assert_eq!(eval(&expr).unwrap(), Value::Bool(false));
}

#[test]
fn explicit_ignorecase_false() {
    let args = startswith(Expr::literal("Hello"), Expr::literal("he"))
        .with_named("ignorecase", Expr::literal(false));
    let expr = call(AffixKind::Prefix, args).unwrap();
    assert!(!expr.as_affix().unwrap().ignore_case());
    assert_eq!(eval(&expr).unwrap(), Value::Bool(false));
}

#[test]
fn endswith_examples() {
    let matching = call(
        AffixKind::Suffix,
        startswith(Expr::literal("filename.log"), Expr::literal(".log")),
    )
    .unwrap();
    let too_long = call(
        AffixKind::Suffix,
        startswith(Expr::literal("log"), Expr::literal("filename.log")),
    )
    .unwrap();
    assert_eq!(eval(&matching).unwrap(), Value::Bool(true));
    assert_eq!(eval(&too_long).unwrap(), Value::Bool(false));
}

#[test]
fn ignorecase_compares_folded_lengths() {
    let record = Record::new().with("city", "İstanbul");
    let args = startswith(Expr::variable("city"), Expr::literal("i\u{307}s"))
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Prefix, args).unwrap();
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));

    let args = startswith(Expr::variable("city"), Expr::literal("BUL"))
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Suffix, args).unwrap();
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));
}

#[test]
fn literal_list_second_needle_matches() {
    let needles = Expr::list(vec![Expr::literal("xyz"), Expr::literal("abc")]);
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::literal("abcdef"), needles),
    )
    .unwrap();
    assert_eq!(eval(&expr).unwrap(), Value::Bool(true));
}

#[test]
fn literal_list_without_match_is_false() {
    let needles = Expr::literal(Value::list(vec![Value::from("x"), Value::from("y")]));
    let expr = call(
        AffixKind::Suffix,
        startswith(Expr::variable("msg"), needles),
    )
    .unwrap();
    let record = Record::new().with("msg", "abc");
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(false));
}

#[test]
fn literal_needles_are_cached_folded() {
    let needles = Expr::list(vec![
        Expr::literal("ABC"),
        Expr::variable("dyn"),
        Expr::literal("Déf"),
    ]);
    let args = startswith(Expr::variable("msg"), needles)
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Prefix, args).unwrap();
    let func = expr.as_affix().unwrap();

    assert_eq!(func.literal_needles(), ["abc".to_string(), "déf".to_string()]);
    assert_eq!(func.dynamic_needles(), [Expr::variable("dyn")]);
}

#[test]
fn literal_needles_checked_before_dynamic_ones() {
    let needles = Expr::list(vec![Expr::variable("missing"), Expr::literal("ab")]);
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("msg"), needles),
    )
    .unwrap();

    let record = Record::new().with("msg", "abc");
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));

    let record = Record::new().with("msg", "xyz");
    let err = eval_with(&expr, &record).unwrap_err();
    assert_eq!(err.message, "failed to evaluate needle");
    assert_eq!(
        err.root_cause().map(|f| f.message.as_str()),
        Some("no such variable: missing")
    );
}

#[test]
fn dynamic_list_elements_are_folded_per_call() {
    let needles = Expr::list(vec![Expr::literal("zzz"), Expr::variable("prefix")]);
    let args = startswith(Expr::variable("msg"), needles)
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Prefix, args).unwrap();

    let record = Record::new().with("msg", "Hello").with("prefix", "HEL");
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));
}

#[test]
fn dynamic_list_element_must_be_string() {
    let needles = Expr::list(vec![Expr::variable("n")]);
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("msg"), needles),
    )
    .unwrap();
    let record = Record::new().with("msg", "abc").with("n", 5_i64);
    let err = eval_with(&expr, &record).unwrap_err();
    assert_eq!(err.message, "needle must be a string, got integer");
    assert!(err.is_type_error());
}

#[test]
fn dynamic_needle_string() {
    let expr = call(
        AffixKind::Suffix,
        startswith(Expr::variable("msg"), Expr::variable("suffix")),
    )
    .unwrap();
    let record = Record::new().with("msg", "core.dump").with("suffix", ".dump");
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));
}

#[test]
fn dynamic_needle_list() {
    let expr = call(
        AffixKind::Suffix,
        startswith(Expr::variable("msg"), Expr::variable("suffixes")),
    )
    .unwrap();
    let suffixes = Value::list(vec![Value::from(".gz"), Value::from(".log")]);
    let record = Record::new().with("msg", "app.log").with("suffixes", suffixes);
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));

    let record = Record::new()
        .with("msg", "app.txt")
        .with("suffixes", Value::list(vec![Value::from(".gz")]));
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(false));
}

#[test]
fn dynamic_needle_of_wrong_type() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("msg"), Expr::variable("n")),
    )
    .unwrap();

    let record = Record::new().with("msg", "abc").with("n", true);
    let err = eval_with(&expr, &record).unwrap_err();
    assert_eq!(err.message, "needle must be a string or a list, got boolean");

    let record = Record::new()
        .with("msg", "abc")
        .with("n", Value::list(vec![Value::Integer(1)]));
    let err = eval_with(&expr, &record).unwrap_err();
    assert_eq!(err.message, "needle list element must be a string, got integer");
}

#[test]
fn haystack_failure_is_wrapped() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("missing"), Expr::literal("a")),
    )
    .unwrap();
    let err = eval(&expr).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Eval);
    assert_eq!(err.message, "failed to evaluate haystack");
    assert_eq!(err.location, Some(Location::inline(1, 1)));
    assert_eq!(err.frames.len(), 1);
}

#[test]
fn haystack_must_be_string() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("n"), Expr::literal("a")),
    )
    .unwrap();
    let record = Record::new().with("n", 42_i64);
    let err = eval_with(&expr, &record).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::Type {
            expected: "a string".to_string(),
            got: "integer".to_string(),
        }
    );
    assert_eq!(err.message, "haystack must be a string, got integer");
}

#[test]
fn named_needles_shape() {
    let args = FunctionArgs::new(vec![Expr::variable("msg")]).with_named(
        "needles",
        Expr::list(vec![Expr::literal("foo"), Expr::literal("bar")]),
    );
    let expr = call(AffixKind::Prefix, args).unwrap();
    let record = Record::new().with("msg", "barbecue");
    assert_eq!(eval_with(&expr, &record).unwrap(), Value::Bool(true));
}

// Construction errors

fn construct_err(kind: AffixKind, args: FunctionArgs) -> ArgumentError {
    call(kind, args).map(|_| ()).unwrap_err()
}

#[test]
fn single_argument_is_rejected() {
    let err = construct_err(
        AffixKind::Prefix,
        FunctionArgs::new(vec![Expr::variable("x")]),
    );
    assert_eq!(err.message, "needle argument is missing");
    assert_eq!(
        err.usage,
        Some("Usage: startswith(my_string, my_prefix[, ignorecase=true])")
    );
}

#[test]
fn no_arguments_is_rejected() {
    let err = construct_err(AffixKind::Suffix, FunctionArgs::default());
    assert_eq!(err.message, "haystack argument is missing");
    assert_eq!(err.function, "endswith");
}

#[test]
fn three_positional_arguments_are_rejected() {
    let args = FunctionArgs::new(vec![
        Expr::variable("x"),
        Expr::variable("y"),
        Expr::variable("z"),
    ]);
    assert_eq!(
        construct_err(AffixKind::Prefix, args).message,
        "too many arguments"
    );
}

#[test]
fn needle_given_twice_is_rejected() {
    let args = startswith(Expr::variable("x"), Expr::literal("a"))
        .with_named("needles", Expr::list(vec![Expr::literal("b")]));
    assert_eq!(
        construct_err(AffixKind::Prefix, args).message,
        "needle given both positionally and as needles"
    );
}

#[test]
fn scalar_named_needles_is_rejected() {
    let args =
        FunctionArgs::new(vec![Expr::variable("x")]).with_named("needles", Expr::literal("a"));
    assert_eq!(
        construct_err(AffixKind::Prefix, args).message,
        "needles must be a list"
    );
}

#[test]
fn non_literal_ignorecase_is_rejected() {
    let args = startswith(Expr::variable("x"), Expr::literal("a"))
        .with_named("ignorecase", Expr::variable("flag"));
    let err = construct_err(AffixKind::Prefix, args);
    assert_eq!(err.message, "ignorecase must be a boolean literal");
    assert!(err.usage.is_some());
}

#[test]
fn non_boolean_ignorecase_is_rejected() {
    let args = startswith(Expr::variable("x"), Expr::literal("a"))
        .with_named("ignorecase", Expr::literal("yes"));
    assert_eq!(
        construct_err(AffixKind::Prefix, args).message,
        "ignorecase must be a boolean literal, got string"
    );
}

#[test]
fn unknown_named_argument_is_rejected() {
    let args = startswith(Expr::variable("x"), Expr::literal("a"))
        .with_named("strict", Expr::literal(true));
    assert_eq!(
        construct_err(AffixKind::Suffix, args).message,
        "unexpected argument: strict"
    );
}

#[test]
fn literal_non_string_needle_is_rejected() {
    let args = startswith(Expr::variable("x"), Expr::literal(5_i64));
    assert_eq!(
        construct_err(AffixKind::Prefix, args).message,
        "needle must be a string or a list of strings, got integer"
    );
}

#[test]
fn literal_non_string_list_element_is_rejected() {
    let needles = Expr::list(vec![Expr::literal("a"), Expr::literal(true)]);
    let args = startswith(Expr::variable("x"), needles);
    assert_eq!(
        construct_err(AffixKind::Prefix, args).message,
        "needle list elements must be strings, got boolean"
    );
}

// Optimization

#[test]
fn literal_call_folds_to_boolean() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::literal("abcdef"), Expr::literal("abc")),
    )
    .unwrap();
    let optimized = expr.optimize().unwrap();
    assert_eq!(optimized, Expr::literal(true));
    assert_eq!(optimized.location(), &Location::inline(1, 1));
    assert!(optimized.optimize().is_none());
}

#[test]
fn dynamic_call_is_not_folded() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("msg"), Expr::literal("abc")),
    )
    .unwrap();
    assert!(expr.optimize().is_none());
}

#[test]
fn non_string_literal_haystack_is_not_folded() {
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::literal(1_i64), Expr::literal("abc")),
    )
    .unwrap();
    assert!(expr.optimize().is_none());
    assert!(eval(&expr).unwrap_err().is_type_error());
}

#[test]
fn optimized_dynamic_element_moves_into_cache() {
    let folded = Expr::ternary(
        Expr::literal(true),
        Some(Expr::literal("ABC")),
        None,
        Location::inline(1, 5),
    );
    let needles = Expr::list(vec![Expr::literal("x"), folded]);
    let args = startswith(Expr::variable("msg"), needles)
        .with_named("ignorecase", Expr::literal(true));
    let expr = call(AffixKind::Prefix, args).unwrap();
    assert_eq!(expr.as_affix().unwrap().dynamic_needles().len(), 1);

    let optimized = expr.optimized();
    let func = optimized.as_affix().unwrap();
    assert_eq!(func.literal_needles(), ["x".to_string(), "abc".to_string()]);
    assert!(func.dynamic_needles().is_empty());
    assert!(optimized.optimize().is_none());

    let record = Record::new().with("msg", "AbCd");
    assert_eq!(eval_with(&optimized, &record).unwrap(), Value::Bool(true));
}

#[test]
fn dynamic_needle_reclassified_after_folding() {
    let folded = Expr::ternary(
        Expr::literal(true),
        Some(Expr::literal("pre")),
        None,
        Location::inline(1, 5),
    );
    let expr = call(
        AffixKind::Prefix,
        startswith(Expr::variable("msg"), folded),
    )
    .unwrap();
    let optimized = expr.optimized();
    assert_eq!(optimized.as_affix().unwrap().literal_needles(), ["pre".to_string()]);
    assert!(optimized.optimize().is_none());
}

// Properties

mod properties {
    use super::super::{AffixKind, fold_case};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn needle_longer_than_haystack_never_matches(
            haystack in ".{0,16}",
            extra in ".{1,4}",
        ) {
            let needle = format!("{haystack}{extra}");
            prop_assert!(!AffixKind::Prefix.matches(&haystack, &needle));
            prop_assert!(!AffixKind::Suffix.matches(&haystack, &needle));
        }

        #[test]
        fn empty_needle_always_matches(haystack in ".{0,32}") {
            prop_assert!(AffixKind::Prefix.matches(&haystack, ""));
            prop_assert!(AffixKind::Suffix.matches(&haystack, ""));
        }

        #[test]
        fn parts_of_concatenation_match(head in ".{0,16}", tail in ".{0,16}") {
            let whole = format!("{head}{tail}");
            prop_assert!(AffixKind::Prefix.matches(&whole, &head));
            prop_assert!(AffixKind::Suffix.matches(&whole, &tail));
        }

        #[test]
        fn folded_ascii_variants_match(word in "[a-zA-Z]{0,12}") {
            let upper = word.to_ascii_uppercase();
            prop_assert!(AffixKind::Prefix.matches(&fold_case(&upper), &fold_case(&word)));
            prop_assert!(AffixKind::Suffix.matches(&fold_case(&word), &fold_case(&upper)));
        }
    }
}
