use lorre_core::{
    decode_block, decode_operation_groups, extract_account_ids, extract_delegate_keys,
};

const BLOCK: &str = include_str!("fixtures/block.json");
const OPERATIONS: &str = include_str!("fixtures/operations.json");

#[test]
fn test_block_fixture() {
    let block = decode_block(BLOCK).unwrap();
    assert_eq!(block.level, 32000);
    assert_eq!(
        block.hash,
        "BMSuUBhSZm3mFVjhLfukCzUy5nVDdANHFo1HfNp5knE1HgjBxfF"
    );
    assert_eq!(
        block.predecessor,
        "BLy6dXLsVMWEW5iNbHnoAmqbWLcTyPnG9fJPVq5wr1VkTxNqcvV"
    );
    assert_eq!(block.meta_cycle, Some(7));
    assert_eq!(block.meta_voting_period, Some(0));
    assert_eq!(block.priority, Some(0));
    assert_eq!(block.consumed_gas, Some(10_200));
}

#[test]
fn test_operations_fixture() {
    let groups = decode_operation_groups(OPERATIONS).unwrap();
    assert_eq!(groups.len(), 3);

    let kinds: Vec<_> = groups
        .iter()
        .flat_map(|g| g.contents.iter().map(lorre_core::Operation::kind))
        .collect();
    assert_eq!(
        kinds,
        vec!["endorsement", "ballot", "transaction", "origination"]
    );

    // The legacy managerPubkey spelling in the fixture must land in the
    // canonical field.
    let origination = &groups[2].contents[1].flatten()[0];
    assert_eq!(
        origination.manager_pubkey.as_deref(),
        Some("tz1hoKtAhPf5PYHkGfPfGTPtV9pK31B1nCVC")
    );
    assert_eq!(origination.balance, Some(200_000));
}

#[test]
fn test_fixture_account_extraction() {
    let groups = decode_operation_groups(OPERATIONS).unwrap();
    let ids = extract_account_ids(&groups);
    assert!(ids.contains(&"tz1hoKtAhPf5PYHkGfPfGTPtV9pK31B1nCVC".to_string()));
    assert!(ids.contains(&"tz1MqVUy7zZMWRTtHFNSnBHnfXi8hYqgeYvP".to_string()));
    assert!(ids.contains(&"KT1WvzYHCNBvDSdwafTHv7nJ1dWmZ8GCYuuC".to_string()));
    // endorsement delegate is an account too
    assert!(ids.contains(&"tz1Yju7jmmsaUiG9qQLoYv35v5pHgnWoLWbt".to_string()));

    let delegates = extract_delegate_keys(Some("tz1baker"), &groups);
    assert!(delegates.contains(&"tz1baker".to_string()));
    assert!(delegates.contains(&"tz1Yju7jmmsaUiG9qQLoYv35v5pHgnWoLWbt".to_string()));
}
