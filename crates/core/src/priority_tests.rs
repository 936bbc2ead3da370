use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn p(v: i32) -> QueuePriority {
    QueuePriority(v)
}

#[test]
fn named_bands() {
    assert_eq!(QueuePriority::VERY_LOW.value(), -8);
    assert_eq!(QueuePriority::LOW.value(), -4);
    assert_eq!(QueuePriority::NORMAL.value(), 0);
    assert_eq!(QueuePriority::HIGH.value(), 4);
    assert_eq!(QueuePriority::VERY_HIGH.value(), 8);
    assert_eq!(QueuePriority::default(), QueuePriority::NORMAL);
}

#[parameterized(
    very_low = { "very-low", -8 },
    low = { "low", -4 },
    normal = { "normal", 0 },
    high = { "high", 4 },
    very_high = { "very_high", 8 },
    positive = { "12", 12 },
    negative = { "-3", -3 },
)]
fn parse_priority(input: &str, expected: i32) {
    assert_eq!(input.parse::<QueuePriority>().unwrap(), p(expected));
}

#[test]
fn parse_rejects_unknown_keyword() {
    let err = "urgent".parse::<QueuePriority>().unwrap_err();
    assert_eq!(err, ConfigError::UnknownPriority("urgent".to_string()));
}

#[test]
fn deserialize_from_integer_or_keyword() {
    #[derive(Deserialize)]
    struct Row {
        priority: QueuePriority,
    }

    let row: Row = toml::from_str("priority = 5").unwrap();
    assert_eq!(row.priority, p(5));
    let row: Row = toml::from_str("priority = \"very-high\"").unwrap();
    assert_eq!(row.priority, QueuePriority::VERY_HIGH);
    assert!(toml::from_str::<Row>("priority = \"soon\"").is_err());
}

#[test]
fn insert_keeps_descending_order() {
    let mut list = Vec::new();
    for v in [5, -2, 8, 0] {
        insert_by_priority(&mut list, p(v), |x| *x);
    }
    assert_eq!(list, vec![p(8), p(5), p(0), p(-2)]);
}

#[test]
fn equal_priorities_stay_first_in_first_out() {
    let mut list: Vec<(QueuePriority, &str)> = Vec::new();
    for item in [(p(1), "a"), (p(3), "b"), (p(1), "c"), (p(3), "d")] {
        insert_by_priority(&mut list, item, |x| x.0);
    }
    let names: Vec<&str> = list.iter().map(|x| x.1).collect();
    assert_eq!(names, vec!["b", "d", "a", "c"]);
}

#[test]
fn insertion_index_on_empty_list_is_zero() {
    let list: Vec<QueuePriority> = Vec::new();
    assert_eq!(insertion_index(&list, p(4), |x| *x), 0);
}

proptest! {
    #[test]
    fn inserted_lists_are_sorted_descending(values in proptest::collection::vec(-100..100i32, 0..40)) {
        let mut list = Vec::new();
        for v in &values {
            insert_by_priority(&mut list, p(*v), |x| *x);
        }

        prop_assert_eq!(list.len(), values.len());
        for i in 1..list.len() {
            prop_assert!(list[i - 1] >= list[i], "not sorted at {}", i);
        }
    }

    #[test]
    fn ties_preserve_insertion_order(values in proptest::collection::vec(-3..3i32, 0..40)) {
        let mut list = Vec::new();
        for (seq, v) in values.iter().enumerate() {
            insert_by_priority(&mut list, (p(*v), seq), |x| x.0);
        }

        for i in 1..list.len() {
            if list[i - 1].0 == list[i].0 {
                prop_assert!(list[i - 1].1 < list[i].1);
            }
        }
    }
}
