use serde::Deserialize;
use serde_json::Value;

use crate::{json::string_to_i64, normalize_manager_pubkey, DecodeError};

pub const OPERATION_KINDS: [&str; 11] = [
    "endorsement",
    "seed_nonce_revelation",
    "activate_account",
    "reveal",
    "transaction",
    "origination",
    "delegation",
    "double_baking_evidence",
    "double_endorsement_evidence",
    "proposals",
    "ballot",
];

#[derive(Debug, Clone, Deserialize)]
pub struct OperationGroup {
    pub protocol: String,
    #[serde(default)]
    pub chain_id: Option<String>,
    pub hash: String,
    pub branch: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub contents: Vec<Operation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Endorsement {
        level: i64,
        #[serde(default)]
        metadata: Option<EndorsementMetadata>,
    },
    SeedNonceRevelation {
        level: i64,
        nonce: String,
    },
    ActivateAccount {
        pkh: String,
        #[serde(default)]
        secret: Option<String>,
    },
    Reveal {
        source: String,
        #[serde(default, deserialize_with = "string_to_i64")]
        fee: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        counter: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        gas_limit: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        storage_limit: Option<i64>,
        public_key: String,
        #[serde(default)]
        metadata: Option<ManagerMetadata>,
    },
    Transaction {
        source: String,
        #[serde(default, deserialize_with = "string_to_i64")]
        fee: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        counter: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        gas_limit: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        storage_limit: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        amount: Option<i64>,
        destination: String,
        #[serde(default)]
        parameters: Option<Value>,
        #[serde(default)]
        metadata: Option<ManagerMetadata>,
    },
    Origination {
        source: String,
        #[serde(default, deserialize_with = "string_to_i64")]
        fee: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        counter: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        gas_limit: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        storage_limit: Option<i64>,
        #[serde(default)]
        manager_pubkey: Option<String>,
        #[serde(default, deserialize_with = "string_to_i64")]
        balance: Option<i64>,
        #[serde(default)]
        spendable: Option<bool>,
        #[serde(default)]
        delegatable: Option<bool>,
        #[serde(default)]
        delegate: Option<String>,
        #[serde(default)]
        script: Option<Value>,
        #[serde(default)]
        metadata: Option<ManagerMetadata>,
    },
    Delegation {
        source: String,
        #[serde(default, deserialize_with = "string_to_i64")]
        fee: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        counter: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        gas_limit: Option<i64>,
        #[serde(default, deserialize_with = "string_to_i64")]
        storage_limit: Option<i64>,
        #[serde(default)]
        delegate: Option<String>,
        #[serde(default)]
        metadata: Option<ManagerMetadata>,
    },
    DoubleBakingEvidence {
        #[serde(default)]
        bh1: Option<Value>,
        #[serde(default)]
        bh2: Option<Value>,
    },
    DoubleEndorsementEvidence {
        #[serde(default)]
        op1: Option<Value>,
        #[serde(default)]
        op2: Option<Value>,
    },
    Proposals {
        source: String,
        period: i64,
        #[serde(default)]
        proposals: Vec<String>,
    },
    Ballot {
        source: String,
        period: i64,
        proposal: String,
        ballot: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndorsementMetadata {
    #[serde(default)]
    pub delegate: Option<String>,
    #[serde(default)]
    pub slots: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerMetadata {
    #[serde(default)]
    pub operation_result: Option<OperationResult>,
    #[serde(default)]
    pub internal_operation_results: Vec<InternalOperation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub consumed_gas: Option<i64>,
    #[serde(default)]
    pub originated_contracts: Vec<String>,
    #[serde(default)]
    pub storage: Option<Value>,
}

/// Operations emitted by contract execution. They share the parent group's
/// hash and are flagged `internal` in the store.
#[derive(Debug, Clone, Deserialize)]
pub struct InternalOperation {
    pub kind: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub nonce: Option<i64>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub amount: Option<i64>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub delegate: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub balance: Option<i64>,
    #[serde(default)]
    pub result: Option<OperationResult>,
}

/// One row of the `operations` table: every kind-specific attribute as an
/// option, plus the flags shared by all kinds.
#[derive(Debug, Clone, Default)]
pub struct FlatOperation {
    pub kind: String,
    pub level: Option<i64>,
    pub nonce: Option<String>,
    pub pkh: Option<String>,
    pub secret: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub delegate: Option<String>,
    pub amount: Option<i64>,
    pub fee: Option<i64>,
    pub counter: Option<i64>,
    pub gas_limit: Option<i64>,
    pub storage_limit: Option<i64>,
    pub public_key: Option<String>,
    pub manager_pubkey: Option<String>,
    pub balance: Option<i64>,
    pub spendable: Option<bool>,
    pub delegatable: Option<bool>,
    pub script: Option<String>,
    pub storage: Option<String>,
    pub parameters: Option<String>,
    pub status: Option<String>,
    pub consumed_gas: Option<i64>,
    pub originated_contracts: Option<String>,
    pub period: Option<i64>,
    pub proposal: Option<String>,
    pub ballot: Option<String>,
    pub internal: bool,
}

impl Operation {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Endorsement { .. } => "endorsement",
            Operation::SeedNonceRevelation { .. } => "seed_nonce_revelation",
            Operation::ActivateAccount { .. } => "activate_account",
            Operation::Reveal { .. } => "reveal",
            Operation::Transaction { .. } => "transaction",
            Operation::Origination { .. } => "origination",
            Operation::Delegation { .. } => "delegation",
            Operation::DoubleBakingEvidence { .. } => "double_baking_evidence",
            Operation::DoubleEndorsementEvidence { .. } => "double_endorsement_evidence",
            Operation::Proposals { .. } => "proposals",
            Operation::Ballot { .. } => "ballot",
        }
    }

    /// The top-level row plus one row per internal operation result.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatOperation> {
        let mut flat = FlatOperation {
            kind: self.kind().to_string(),
            ..FlatOperation::default()
        };
        let mut metadata = None;

        match self {
            Operation::Endorsement {
                level,
                metadata: meta,
            } => {
                flat.level = Some(*level);
                flat.delegate = meta.as_ref().and_then(|m| m.delegate.clone());
            }
            Operation::SeedNonceRevelation { level, nonce } => {
                flat.level = Some(*level);
                flat.nonce = Some(nonce.clone());
            }
            Operation::ActivateAccount { pkh, secret } => {
                flat.pkh = Some(pkh.clone());
                flat.secret = secret.clone();
            }
            Operation::Reveal {
                source,
                fee,
                counter,
                gas_limit,
                storage_limit,
                public_key,
                metadata: meta,
            } => {
                flat.source = Some(source.clone());
                flat.fee = *fee;
                flat.counter = *counter;
                flat.gas_limit = *gas_limit;
                flat.storage_limit = *storage_limit;
                flat.public_key = Some(public_key.clone());
                metadata = meta.as_ref();
            }
            Operation::Transaction {
                source,
                fee,
                counter,
                gas_limit,
                storage_limit,
                amount,
                destination,
                parameters,
                metadata: meta,
            } => {
                flat.source = Some(source.clone());
                flat.fee = *fee;
                flat.counter = *counter;
                flat.gas_limit = *gas_limit;
                flat.storage_limit = *storage_limit;
                flat.amount = *amount;
                flat.destination = Some(destination.clone());
                flat.parameters = parameters.as_ref().map(ToString::to_string);
                metadata = meta.as_ref();
            }
            Operation::Origination {
                source,
                fee,
                counter,
                gas_limit,
                storage_limit,
                manager_pubkey,
                balance,
                spendable,
                delegatable,
                delegate,
                script,
                metadata: meta,
            } => {
                flat.source = Some(source.clone());
                flat.fee = *fee;
                flat.counter = *counter;
                flat.gas_limit = *gas_limit;
                flat.storage_limit = *storage_limit;
                flat.manager_pubkey = manager_pubkey.clone();
                flat.balance = *balance;
                flat.spendable = *spendable;
                flat.delegatable = *delegatable;
                flat.delegate = delegate.clone();
                flat.script = script.as_ref().map(ToString::to_string);
                metadata = meta.as_ref();
            }
            Operation::Delegation {
                source,
                fee,
                counter,
                gas_limit,
                storage_limit,
                delegate,
                metadata: meta,
            } => {
                flat.source = Some(source.clone());
                flat.fee = *fee;
                flat.counter = *counter;
                flat.gas_limit = *gas_limit;
                flat.storage_limit = *storage_limit;
                flat.delegate = delegate.clone();
                metadata = meta.as_ref();
            }
            Operation::DoubleBakingEvidence { .. }
            | Operation::DoubleEndorsementEvidence { .. } => {}
            Operation::Proposals {
                source,
                period,
                proposals,
            } => {
                flat.source = Some(source.clone());
                flat.period = Some(*period);
                flat.proposal = Some(proposals.join(","));
            }
            Operation::Ballot {
                source,
                period,
                proposal,
                ballot,
            } => {
                flat.source = Some(source.clone());
                flat.period = Some(*period);
                flat.proposal = Some(proposal.clone());
                flat.ballot = Some(ballot.clone());
            }
        }

        if let Some(result) = metadata.and_then(|m| m.operation_result.as_ref()) {
            flat.status = result.status.clone();
            flat.consumed_gas = result.consumed_gas;
            flat.storage = result.storage.as_ref().map(ToString::to_string);
            if !result.originated_contracts.is_empty() {
                flat.originated_contracts = Some(result.originated_contracts.join(","));
            }
        }

        let mut rows = vec![flat];
        for internal in metadata.map(|m| m.internal_operation_results.as_slice()).unwrap_or(&[]) {
            rows.push(internal.flatten());
        }
        rows
    }
}

impl InternalOperation {
    fn flatten(&self) -> FlatOperation {
        let result = self.result.as_ref();
        FlatOperation {
            kind: self.kind.clone(),
            source: self.source.clone(),
            nonce: self.nonce.map(|n| n.to_string()),
            amount: self.amount,
            destination: self.destination.clone(),
            delegate: self.delegate.clone(),
            public_key: self.public_key.clone(),
            balance: self.balance,
            status: result.and_then(|r| r.status.clone()),
            consumed_gas: result.and_then(|r| r.consumed_gas),
            originated_contracts: result.and_then(|r| {
                (!r.originated_contracts.is_empty()).then(|| r.originated_contracts.join(","))
            }),
            internal: true,
            ..FlatOperation::default()
        }
    }
}

/// Decodes the node's `blocks/{hash}/operations` body: an array of
/// operation-group arrays, one per validation pass. Legacy manager key
/// spellings are normalised first; an unrecognised kind anywhere is an error.
pub fn decode_operation_groups(body: &str) -> Result<Vec<OperationGroup>, DecodeError> {
    let value: Value = serde_json::from_str(body)?;
    let value = normalize_manager_pubkey(value);

    let passes = value.as_array().cloned().unwrap_or_default();
    let mut groups = Vec::new();
    for pass in passes {
        for group in pass.as_array().cloned().unwrap_or_default() {
            check_known_kinds(&group)?;
            groups.push(serde_json::from_value::<OperationGroup>(group)?);
        }
    }
    Ok(groups)
}

fn check_known_kinds(group: &Value) -> Result<(), DecodeError> {
    let contents = group["contents"].as_array().cloned().unwrap_or_default();
    for content in contents {
        let kind = content["kind"].as_str().unwrap_or_default();
        if !OPERATION_KINDS.contains(&kind) {
            return Err(DecodeError::UnknownOperationKind(kind.to_string()));
        }
        let internals = content["metadata"]["internal_operation_results"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        for internal in internals {
            let kind = internal["kind"].as_str().unwrap_or_default();
            if !OPERATION_KINDS.contains(&kind) {
                return Err(DecodeError::UnknownOperationKind(kind.to_string()));
            }
        }
    }
    Ok(())
}

/// Distinct account ids referenced by a set of operation groups, in sorted
/// order. These are the accounts whose fresh state must be re-read later.
#[must_use]
pub fn extract_account_ids(groups: &[OperationGroup]) -> Vec<String> {
    let mut ids = std::collections::BTreeSet::new();
    for group in groups {
        for op in &group.contents {
            for flat in op.flatten() {
                for id in [
                    flat.source,
                    flat.destination,
                    flat.delegate,
                    flat.pkh,
                    flat.manager_pubkey,
                ]
                .into_iter()
                .flatten()
                {
                    ids.insert(id);
                }
                if let Some(originated) = flat.originated_contracts {
                    for id in originated.split(',') {
                        ids.insert(id.to_string());
                    }
                }
            }
        }
    }
    ids.into_iter().collect()
}

/// Distinct delegate key hashes referenced by a block's operations (plus its
/// baker, passed separately since it lives on the block record).
#[must_use]
pub fn extract_delegate_keys(baker: Option<&str>, groups: &[OperationGroup]) -> Vec<String> {
    let mut keys = std::collections::BTreeSet::new();
    if let Some(baker) = baker {
        keys.insert(baker.to_string());
    }
    for group in groups {
        for op in &group.contents {
            for flat in op.flatten() {
                if let Some(delegate) = flat.delegate {
                    keys.insert(delegate);
                }
            }
        }
    }
    keys.into_iter().collect()
}
