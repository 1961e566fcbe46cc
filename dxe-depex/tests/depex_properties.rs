//! Property tests for the dependency expression evaluator

use std::collections::HashSet;

use dxe_api::guid::ARCH_PROTOCOLS;
use dxe_api::{Guid, ProtocolLookup};
use dxe_depex::{opcode, Depex, DepexPhase, DriverDepex, Evaluator, Readiness};
use proptest::prelude::*;

#[derive(Debug)]
struct Installed(HashSet<Guid>);

impl ProtocolLookup for Installed {
    fn is_installed(&self, protocol: &Guid) -> bool {
        self.0.contains(protocol)
    }
}

/// Instructions drawn from the whole opcode space, plus garbage bytes
fn instruction() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        (0usize..ARCH_PROTOCOLS.len()).prop_map(|i| {
            let mut bytes = vec![opcode::PUSH];
            bytes.extend_from_slice(&ARCH_PROTOCOLS[i].to_bytes());
            bytes
        }),
        prop::sample::select(vec![
            opcode::AND,
            opcode::OR,
            opcode::NOT,
            opcode::TRUE,
            opcode::FALSE,
            opcode::END,
            opcode::SOR,
        ])
        .prop_map(|op| vec![op]),
        any::<u8>().prop_map(|byte| vec![byte]),
    ]
}

fn expression() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(instruction(), 0..24).prop_map(|parts| parts.concat())
}

/// Expressions without NOT, whose value can only rise as protocols appear
fn monotone_expression() -> impl Strategy<Value = Vec<u8>> {
    let instruction = prop_oneof![
        (0usize..ARCH_PROTOCOLS.len()).prop_map(|i| {
            let mut bytes = vec![opcode::PUSH];
            bytes.extend_from_slice(&ARCH_PROTOCOLS[i].to_bytes());
            bytes
        }),
        prop::sample::select(vec![opcode::AND, opcode::OR, opcode::TRUE, opcode::FALSE, opcode::END])
            .prop_map(|op| vec![op]),
    ];
    prop::collection::vec(instruction, 0..24).prop_map(|parts| parts.concat())
}

fn installed() -> impl Strategy<Value = Installed> {
    prop::collection::hash_set(prop::sample::select(ARCH_PROTOCOLS.to_vec()), 0..ARCH_PROTOCOLS.len())
        .prop_map(Installed)
}

proptest! {
    #[test]
    fn test_stack_is_empty_after_every_evaluation(bytes in expression(), registry in installed()) {
        let mut evaluator = Evaluator::default();
        let mut record = DriverDepex::new(Some(Depex::new(bytes)), DepexPhase::Dxe);
        evaluator.evaluate(&mut record, &registry);
        prop_assert_eq!(evaluator.stack_depth(), 0);
    }

    #[test]
    fn test_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128), registry in installed()) {
        for phase in [DepexPhase::Dxe, DepexPhase::Pei] {
            let mut evaluator = Evaluator::new(dxe_depex::EvaluatorConfig::for_phase(phase));
            let mut record = DriverDepex::new(Some(Depex::new(bytes.clone())), phase);
            evaluator.evaluate(&mut record, &registry);
            prop_assert_eq!(evaluator.stack_depth(), 0);
        }
    }

    #[test]
    fn test_result_depends_only_on_declared_bytes(
        bytes in expression(),
        cut in any::<prop::sample::Index>(),
        tail in prop::collection::vec(any::<u8>(), 1..32),
        registry in installed(),
    ) {
        let declared = cut.index(bytes.len() + 1);
        let mut padded = bytes[..declared].to_vec();
        padded.extend_from_slice(&tail);

        let mut evaluator = Evaluator::default();
        let mut exact = DriverDepex::new(Some(Depex::new(bytes[..declared].to_vec())), DepexPhase::Dxe);
        let mut bounded = DriverDepex::new(Some(Depex::with_declared_size(padded, declared)), DepexPhase::Dxe);

        prop_assert_eq!(
            evaluator.evaluate(&mut exact, &registry),
            evaluator.evaluate(&mut bounded, &registry)
        );
    }

    #[test]
    fn test_evaluation_is_idempotent(bytes in expression(), registry in installed()) {
        let mut evaluator = Evaluator::default();
        let mut record = DriverDepex::new(Some(Depex::new(bytes)), DepexPhase::Dxe);
        let first = evaluator.evaluate(&mut record, &registry);
        let second = evaluator.evaluate(&mut record, &registry);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_memo_replays_previous_lookups(bytes in expression(), registry in installed()) {
        let mut evaluator = Evaluator::default();
        let mut record = DriverDepex::new(Some(Depex::new(bytes)), DepexPhase::Dxe);
        let first = evaluator.evaluate(&mut record, &registry);

        // Every protocol found installed is served from the memo afterwards.
        let empty = Installed(HashSet::new());
        prop_assert_eq!(evaluator.evaluate(&mut record, &empty), first);
        prop_assert!(record.satisfied().iter().all(|p| registry.0.contains(p)));
    }

    #[test]
    fn test_ready_stays_ready_as_protocols_appear(
        bytes in monotone_expression(),
        registry in installed(),
        extra in installed(),
    ) {
        let mut evaluator = Evaluator::default();
        let mut record = DriverDepex::new(Some(Depex::new(bytes)), DepexPhase::Dxe);

        if evaluator.evaluate(&mut record, &registry) == Readiness::Ready {
            let grown = Installed(registry.0.union(&extra.0).copied().collect());
            prop_assert_eq!(evaluator.evaluate(&mut record, &grown), Readiness::Ready);
        }
    }

    #[test]
    fn test_before_after_always_ordered(
        directive in prop::sample::select(vec![opcode::BEFORE, opcode::AFTER]),
        driver in prop::sample::select(ARCH_PROTOCOLS.to_vec()),
        rest in expression(),
        registry in installed(),
    ) {
        let mut bytes = vec![directive];
        bytes.extend_from_slice(&driver.to_bytes());
        bytes.extend_from_slice(&rest);

        let mut evaluator = Evaluator::default();
        let mut record = DriverDepex::new(Some(Depex::new(bytes)), DepexPhase::Dxe);
        prop_assert!(record.flags().is_ordered());
        prop_assert_eq!(record.before_after(), Some(driver));
        prop_assert_eq!(evaluator.evaluate(&mut record, &registry), Readiness::Ordered);
    }
}
