//! Property tests for damage, healing and regeneration.

use proptest::prelude::*;
use skirmish_core::components::layered_damage;
use skirmish_core::prelude::*;
use skirmish_test_utils::determinism::strategies::{arb_damage_sequence, arb_unit_kind};
use skirmish_test_utils::fixtures::pos;

fn unit(kind: UnitKind) -> Unit {
    Unit::new(EntityId::new(PlayerId(0), 0), kind, pos(100, 100))
}

proptest! {
    #[test]
    fn prop_pools_stay_in_bounds(
        kind in arb_unit_kind(),
        damage in arb_damage_sequence(40),
        heals in arb_damage_sequence(40),
    ) {
        let mut unit = unit(kind);
        for (hit, heal) in damage.iter().zip(heals.iter().chain(std::iter::repeat(&0))) {
            unit.receive_damage(*hit);
            unit.heal(*heal);

            let health = unit.health();
            prop_assert!(health.current() >= Fixed::ZERO);
            prop_assert!(health.current() <= health.max());
            if let Some(shield) = unit.shield() {
                prop_assert!(shield.current() >= Fixed::ZERO);
                prop_assert!(shield.current() <= shield.max());
            }
        }
    }

    #[test]
    fn prop_layered_damage_accounts_for_every_point(
        shield_max in 0u32..200,
        health_max in 1u32..200,
        damage in arb_damage_sequence(30),
    ) {
        let mut shield = Pool::full(shield_max);
        let mut health = Pool::full(health_max);

        for amount in damage {
            let before = shield.current() + health.current();
            let (absorbed, lost) = layered_damage(Some(&mut shield), &mut health, amount);

            prop_assert!(absorbed + lost <= Fixed::from_num(amount));
            prop_assert_eq!(before - absorbed - lost, shield.current() + health.current());
            // health only suffers once the shield is gone
            if lost > Fixed::ZERO {
                prop_assert!(shield.is_empty());
            }
        }
    }

    #[test]
    fn prop_dead_units_cannot_be_healed(kind in arb_unit_kind(), heal in 1u32..100) {
        let mut unit = unit(kind);
        let overkill = unit.stats().health + unit.stats().max_shield + 1;
        unit.receive_damage(overkill);

        prop_assert!(!unit.is_alive());
        prop_assert_eq!(unit.heal(heal), Fixed::ZERO);
        prop_assert!(!unit.is_alive());
    }
}
