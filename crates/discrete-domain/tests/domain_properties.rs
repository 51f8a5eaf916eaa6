use approx::assert_relative_eq;
use discrete_domain::{
    DiscreteDomain, DomainError, DomainKind, DomainRegistry, DomainValue, JointDomainIndexer,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn sample_domains() -> Vec<DiscreteDomain> {
    let joint_parts = [
        DiscreteDomain::bit(),
        DiscreteDomain::from_values(["p", "q", "r"]).unwrap(),
    ];
    vec![
        DiscreteDomain::bit(),
        DiscreteDomain::boolean(),
        DiscreteDomain::int_range(-5, 20, 5).unwrap(),
        DiscreteDomain::real_range(-1.0, 1.0, 0.25).unwrap(),
        DiscreteDomain::from_values([0.5, -0.0, 3.25, 1e-3]).unwrap(),
        DiscreteDomain::from_values([7i64, -3, 12]).unwrap(),
        DiscreteDomain::from_values(["x", "y", "z"]).unwrap(),
        DiscreteDomain::enumeration(&["low", "mid", "high"]).unwrap(),
        DiscreteDomain::joint_of(&joint_parts).unwrap(),
    ]
}

#[test]
fn test_bijection_for_every_variant() {
    for domain in sample_domains() {
        for i in 0..domain.size() {
            let value = domain.value_at(i);
            assert_eq!(domain.index_of(&value), Some(i), "{domain:?} element {i}");
            assert_eq!(domain.value_at(domain.index_of(&value).unwrap()), value);
        }
        assert_eq!(domain.elements().len(), domain.size());
    }
}

#[test]
fn test_signed_zero_maps_to_one_index() {
    let range = DiscreteDomain::real_range(-1.0, 1.0, 0.25).unwrap();
    let array = DiscreteDomain::from_values([0.5, -0.0, 3.25]).unwrap();
    for domain in [range, array] {
        let positive = domain.index_of(&DomainValue::Real(0.0));
        let negative = domain.index_of(&DomainValue::Real(-0.0));
        assert!(positive.is_some());
        assert_eq!(positive, negative);
    }
}

#[test]
fn test_real_range_values() {
    let d = DiscreteDomain::real_range(0.0, 1.0, 0.1).unwrap();
    assert_eq!(d.kind(), DomainKind::RealRange);
    assert_eq!(d.size(), 11);
    assert_relative_eq!(d.value_at(7).as_real().unwrap(), 0.7, epsilon = 1e-12);
    assert_eq!(d.index_of(&DomainValue::Real(0.7)), Some(7));
    assert_eq!(d.index_of(&DomainValue::Real(0.75)), None);

    let r = d.as_real_range().unwrap();
    assert_relative_eq!(r.tolerance(), 1e-7, max_relative = 1e-9);
}

#[test]
fn test_scenario_int_range_and_text() {
    let registry = DomainRegistry::new();
    let a = registry.domain([0i64, 2, 4, 6]).unwrap();
    let b = registry.domain(["x", "y"]).unwrap();
    assert_eq!(a.kind(), DomainKind::IntRange);

    let indexer = registry.indexer(&[a, b]).unwrap();
    assert_eq!(indexer.cardinality().unwrap(), 8);
    assert_eq!(indexer.stride(0).unwrap(), 1);
    assert_eq!(indexer.stride(1).unwrap(), 4);
    assert_eq!(indexer.joint_index_from_indices(&[2, 1]).unwrap(), 6);
    assert_eq!(indexer.joint_index_to_indices(6).unwrap(), vec![2, 1]);
}

#[test]
fn test_random_round_trips() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let pool = sample_domains();

    for _ in 0..50 {
        let len = rng.gen_range(1..5);
        let domains: Vec<DiscreteDomain> = (0..len)
            .map(|_| pool[rng.gen_range(0..pool.len())].clone())
            .collect();
        let outputs: Vec<usize> = (0..len).filter(|_| rng.gen_bool(0.5)).collect();
        let indexer = if rng.gen_bool(0.5) {
            JointDomainIndexer::directed(&domains, &outputs).unwrap()
        } else {
            JointDomainIndexer::new(&domains).unwrap()
        };

        let card = indexer.cardinality().unwrap();
        let mut hit = vec![false; card];
        for indices in indexer.iter_indices() {
            let joint = indexer.joint_index_from_indices(&indices).unwrap();
            assert!(joint < card);
            assert!(!hit[joint], "joint index {joint} produced twice");
            hit[joint] = true;
            assert_eq!(indexer.joint_index_to_indices(joint).unwrap(), indices);

            let elements = indexer.elements_from_indices(&indices);
            assert_eq!(indexer.joint_index_from_elements(&elements).unwrap(), joint);
        }
        assert!(hit.iter().all(|&h| h));
    }
}

#[test]
fn test_large_domain_capacity_error() {
    let big = DiscreteDomain::range(0, 49_999).unwrap();
    let indexer = JointDomainIndexer::new(&[big.clone(), big]).unwrap();
    assert!(!indexer.supports_joint_indexing());

    match indexer.joint_index_from_indices(&[40_000, 40_000]) {
        Err(DomainError::JointIndexingUnsupported { cardinality }) => {
            assert_relative_eq!(cardinality, 2.5e9, max_relative = 1e-9);
        }
        other => panic!("expected capacity error, got {other:?}"),
    }

    assert!(matches!(
        DiscreteDomain::joint(&indexer),
        Err(DomainError::JointIndexingUnsupported { .. })
    ));

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let indices = indexer.random_indices(&mut rng);
    indexer.validate_indices(&indices).unwrap();
    assert!(indexer.random_joint_index(&mut rng).is_err());
}

#[test]
fn test_interned_equality_contract() {
    let registry = DomainRegistry::new();
    let a = registry.domain(["x", "y"]).unwrap();
    let b = registry.domain(["x", "y"]).unwrap();
    assert!(a.ptr_eq(&b));

    // equal but independently built handles agree on hash and equality
    let loose = DiscreteDomain::from_values(["x", "y"]).unwrap();
    assert_eq!(loose, a);
    assert_eq!(loose.hash_code(), a.hash_code());
    assert!(!loose.ptr_eq(&a));
    assert!(registry.intern_domain(&loose).ptr_eq(&a));
}
