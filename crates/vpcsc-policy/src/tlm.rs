//! # Justification (TLM) Validation
//!
//! Decides whether a third-party-access justification token must be
//! supplied before any rule is synthesized. Only two legs are gated:
//!
//! - ingress from an unowned source calling from a public IP;
//! - egress to an unowned destination, public or not.
//!
//! Ingress from an unowned but non-public network is not gated.

use vpcsc_core::{Direction, DirectionDecision, TlmDecision, TlmTrigger, ViolationRecord};

/// Evaluate the justification requirement. Never required for `SKIP`.
pub fn validate(record: &ViolationRecord, decision: &DirectionDecision) -> TlmDecision {
    let direction = decision.direction();
    if direction == Direction::Skip {
        return TlmDecision::not_required();
    }
    if direction.includes_ingress() && decision.source_perimeter().is_none() && record.is_public_ip {
        return TlmDecision::required(TlmTrigger::PublicIngress);
    }
    if direction.includes_egress() && decision.dest_perimeter().is_none() {
        return TlmDecision::required(TlmTrigger::ExternalEgress);
    }
    TlmDecision::not_required()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::direction::classify;
    use proptest::prelude::*;
    use vpcsc_core::PerimeterName;

    fn perimeter() -> impl Strategy<Value = Option<PerimeterName>> {
        proptest::option::of("[ab]".prop_map(|s| PerimeterName::new(s).unwrap()))
    }

    proptest! {
        #[test]
        fn required_only_with_a_trigger(
            source in perimeter(),
            dest in perimeter(),
            public in any::<bool>(),
        ) {
            let decision = classify(source.as_ref(), dest.as_ref());
            let mut record = ViolationRecord::empty();
            record.is_public_ip = public;
            let tlm = validate(&record, &decision);

            let direction = decision.direction();
            let ingress_trigger = direction.includes_ingress() && source.is_none() && public;
            let egress_trigger = direction.includes_egress() && dest.is_none();
            prop_assert_eq!(tlm.is_required(), ingress_trigger || egress_trigger);
            prop_assert_eq!(tlm.is_required(), tlm.reason().is_some());
            if direction == Direction::Skip {
                prop_assert!(!tlm.is_required());
            }
        }
    }
}
