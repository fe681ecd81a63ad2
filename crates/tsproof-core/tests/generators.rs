use proptest::prelude::*;
use tsproof_core::attestation::{BITCOIN_TAG, PENDING_TAG};
use tsproof_core::{Attestation, Op, Timestamp};

/// Tree layout independent of any root message. [`build`] turns it into a
/// real proof once the root is known, so several shapes can be grown from
/// one message and merged.
#[derive(Debug, Clone)]
pub struct Shape {
    pub attestations: Vec<Attestation>,
    pub edges: Vec<(Op, Shape)>,
}

pub fn arb_msg() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(any::<u8>(), 1..16)
}

pub fn arb_op() -> impl Strategy<Value = Op> + Clone {
    let arg = prop::collection::vec(any::<u8>(), 0..8);
    prop_oneof![
        Just(Op::Sha1),
        Just(Op::Ripemd160),
        Just(Op::Sha256),
        arg.clone().prop_map(Op::Append),
        arg.prop_map(Op::Prepend),
        Just(Op::Reverse),
        Just(Op::Hexlify),
    ]
}

pub fn arb_attestation() -> impl Strategy<Value = Attestation> + Clone {
    prop_oneof![
        "[a-z0-9]{1,12}".prop_map(|host| {
            Attestation::pending(format!("https://{host}.example")).expect("generated uri is valid")
        }),
        (0u64..1_000_000).prop_map(|height| Attestation::Bitcoin { height }),
        (
            any::<[u8; 8]>().prop_filter("known tag", |t| *t != PENDING_TAG && *t != BITCOIN_TAG),
            prop::collection::vec(any::<u8>(), 0..16),
        )
            .prop_map(|(tag, payload)| Attestation::Unknown { tag, payload }),
    ]
}

pub fn arb_shape() -> BoxedStrategy<Shape> {
    let leaf = prop::collection::vec(arb_attestation(), 1..3).prop_map(|attestations| Shape {
        attestations,
        edges: Vec::new(),
    });
    leaf.prop_recursive(4, 24, 3, |inner| {
        (
            prop::collection::vec(arb_attestation(), 0..2),
            prop::collection::vec((arb_op(), inner), 1..3),
        )
            .prop_map(|(attestations, edges)| Shape { attestations, edges })
    })
    .boxed()
}

/// Grow `shape` from `msg`. Every leaf carries at least one attestation, so
/// the result always serializes to a readable proof.
pub fn build(msg: &[u8], shape: &Shape) -> Timestamp {
    let mut ts = Timestamp::new(msg.to_vec());
    grow(&mut ts, shape);
    ts
}

fn grow(node: &mut Timestamp, shape: &Shape) {
    for attestation in &shape.attestations {
        node.attest(attestation.clone());
    }
    for (op, child_shape) in &shape.edges {
        let child = node.add_op(op.clone()).expect("generated ops stay within bounds");
        grow(child, child_shape);
    }
    if node.ops().is_empty() && node.attestations().is_empty() {
        node.attest(Attestation::Bitcoin { height: 0 });
    }
}

pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (arb_msg(), arb_shape()).prop_map(|(msg, shape)| build(&msg, &shape))
}
