//! Property-based tests for distribution and binding order.

mod common;

use proptest::prelude::*;

use ts_mapper::mapping::{
    DirectRule, DistributionResolver, EvaluationContext, GroupRule, KeySpec, MappingRules, Split,
};
use ts_mapper::network::EquipmentVariable;

fn positive_keys() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..1.0e4, 1..12)
}

proptest! {
    #[test]
    fn positive_keys_preserve_sum(value in -1.0e6f64..1.0e6, keys in positive_keys()) {
        let resolver = DistributionResolver::new(1e-4);
        let mut shares = Vec::new();
        prop_assert_eq!(resolver.split(value, &keys, &mut shares), Split::Proportional);
        prop_assert_eq!(shares.len(), keys.len());

        let sum: f64 = shares.iter().sum();
        prop_assert!((sum - value).abs() <= 1e-9 * value.abs().max(1.0));
        for share in &shares {
            prop_assert!(share.abs() <= value.abs() * (1.0 + 1e-12));
        }
    }

    #[test]
    fn zero_keys_split_equally(value in -1.0e6f64..1.0e6, n in 1usize..12) {
        let resolver = DistributionResolver::new(1e-4);
        let mut shares = Vec::new();
        prop_assert_eq!(resolver.split(value, &vec![0.0; n], &mut shares), Split::Equal);
        for share in &shares {
            prop_assert_eq!(*share, value / n as f64);
        }
    }

    #[test]
    fn rule_order_does_not_change_output(
        direct in Just(vec![
            ("a", "PST1", None),
            ("b", "L2", None),
            ("c", "HVDC1", None),
            ("d", "L1", Some(EquipmentVariable::Q0)),
            ("e", "L1", None),
        ]).prop_shuffle(),
        group_first in any::<bool>(),
    ) {
        let net = common::small_network();
        let store = common::store_of(&[
            ("a", &[1.0, 2.0]),
            ("b", &[3.0, 4.0]),
            ("c", &[5.0, 6.0]),
            ("d", &[7.0, 8.0]),
            ("e", &[9.0, 10.0]),
            ("wind", &[100.0, 200.0]),
        ]);
        let direct_rules: Vec<DirectRule> = direct
            .iter()
            .map(|&(series, id, variable)| {
                let rule = DirectRule::new(series, id);
                match variable {
                    Some(v) => rule.variable(v),
                    None => rule,
                }
            })
            .collect();
        let group = GroupRule::new("wind", if group_first { ["G1", "G2"] } else { ["G2", "G1"] })
            .key(KeySpec::Attribute(EquipmentVariable::MaxP));

        let shuffled = MappingRules {
            direct: direct_rules,
            group: vec![group.clone()],
            ..Default::default()
        };
        let canonical = MappingRules {
            direct: vec![
                DirectRule::new("e", "L1"),
                DirectRule::new("b", "L2"),
                DirectRule::new("d", "L1").variable(EquipmentVariable::Q0),
                DirectRule::new("a", "PST1"),
                DirectRule::new("c", "HVDC1"),
            ],
            group: vec![group],
            ..Default::default()
        };

        let ctx = EvaluationContext::new([1, 0]);
        let a = common::record(&shuffled, &net, &store, &ctx);
        let b = common::record(&canonical, &net, &store, &ctx);
        prop_assert_eq!(a.records, b.records);
    }
}
