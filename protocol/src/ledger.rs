//! # Ledger Engine
//!
//! [`Ledger`] is the one object a node holds: the block store, the pending
//! pool, the peer registry and the transport used for conflict resolution.
//! Request handlers share it as an `Arc<Ledger>`; nothing here is global, so
//! tests build as many isolated instances as they like.
//!
//! ## Locking
//!
//! The chain and the pool sit behind a single `RwLock`. Every operation that
//! touches both (forging drains the pool and appends a block; staging reads
//! the tip index and pushes a transaction; consensus swaps the chain) holds
//! the write lock for its whole critical section, so no reader ever sees a
//! block appended without its transactions leaving the pool, or a chain
//! half-replaced. The peer registry has its own lock.
//!
//! No lock is held while mining or while peers are being queried.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::LedgerConfig;
use crate::consensus::pow::{mine_off_thread, proof_of_work_with, MiningError, MiningOptions, ProofSearch};
use crate::consensus::resolver::find_longest_chain;
use crate::consensus::validator::is_valid_chain_with;
use crate::consensus::Difficulty;
use crate::network::mempool::TransactionPool;
use crate::network::registry::{NodeRegistry, RegistryError};
use crate::network::transport::{HttpPeerClient, PeerClient};
use crate::storage::block::{hash_block, now_millis, Block};
use crate::storage::chain::Chain;
use crate::transaction::Transaction;

/// Chain and pool, mutated together.
#[derive(Debug)]
struct LedgerState {
    chain: Chain,
    pool: TransactionPool,
}

/// The ledger engine.
pub struct Ledger {
    state: RwLock<LedgerState>,
    registry: NodeRegistry,
    client: Arc<dyn PeerClient>,
    config: LedgerConfig,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Ledger")
            .field("length", &state.chain.len())
            .field("pending", &state.pool.len())
            .field("nodes", &self.registry.len())
            .field("difficulty", &self.config.difficulty.suffix())
            .finish()
    }
}

impl Ledger {
    /// Creates a ledger holding only a freshly stamped genesis block.
    pub fn new(config: LedgerConfig, client: Arc<dyn PeerClient>) -> Self {
        let chain = Chain::new(now_millis());
        tracing::info!(
            difficulty = %config.difficulty,
            genesis = %hash_block(chain.tip()),
            "ledger initialized"
        );
        Self {
            state: RwLock::new(LedgerState {
                chain,
                pool: TransactionPool::new(),
            }),
            registry: NodeRegistry::new(),
            client,
            config,
        }
    }

    /// A ledger that reaches peers over HTTP, honouring
    /// `config.peer_timeout`.
    pub fn with_http_client(config: LedgerConfig) -> Self {
        let client = Arc::new(HttpPeerClient::with_timeout(config.peer_timeout));
        Self::new(config, client)
    }

    // -- Block store ---------------------------------------------------------

    /// Forges the next block from every pending transaction and appends it.
    ///
    /// `previous_hash` defaults to the digest of the current tip. The pool is
    /// empty afterwards.
    pub fn create_block(&self, proof: u64, previous_hash: Option<String>) -> Block {
        let mut state = self.state.write();
        let transactions = state.pool.drain();
        let block = state
            .chain
            .forge(proof, previous_hash, transactions, now_millis());
        tracing::info!(
            index = block.index,
            proof = block.proof,
            tx_count = block.tx_count(),
            "block forged"
        );
        block
    }

    /// The latest block.
    pub fn last_block(&self) -> Block {
        self.state.read().chain.tip().clone()
    }

    /// Snapshot of the whole chain, genesis first.
    pub fn chain(&self) -> Vec<Block> {
        self.state.read().chain.blocks().to_vec()
    }

    /// Number of blocks, genesis included.
    pub fn chain_len(&self) -> usize {
        self.state.read().chain.len()
    }

    // -- Transaction pool ----------------------------------------------------

    /// Stages `tx` and returns the index of the block it should land in.
    pub fn create_transaction(&self, tx: Transaction) -> u64 {
        let mut state = self.state.write();
        let next_index = state.chain.next_index();
        tracing::debug!(%tx, next_index, "transaction staged");
        state.pool.push(tx);
        next_index
    }

    /// Snapshot of the pending transactions in arrival order.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.read().pool.pending().to_vec()
    }

    /// Number of pending transactions.
    pub fn pending_len(&self) -> usize {
        self.state.read().pool.len()
    }

    // -- Proof of work -------------------------------------------------------

    /// Blocking, unbounded proof search at this ledger's difficulty.
    pub fn proof_of_work(&self, last_proof: u64) -> u64 {
        proof_of_work_with(last_proof, &self.config.difficulty)
    }

    /// Checks a proof at this ledger's difficulty.
    pub fn is_valid_proof(&self, last_proof: u64, proof: u64) -> bool {
        self.config.difficulty.accepts(last_proof, proof)
    }

    /// Checks a chain at this ledger's difficulty.
    pub fn is_valid_chain(&self, chain: &[Block]) -> bool {
        is_valid_chain_with(chain, &self.config.difficulty)
    }

    /// Canonical digest of `block`.
    pub fn hash(block: &Block) -> String {
        hash_block(block)
    }

    /// Mines and forges one block on a blocking worker.
    ///
    /// Finds a proof for the current tip off the async runtime, then stages a
    /// reward transaction for `reward_recipient` and forges the block. If
    /// another block was committed (or the chain replaced) while searching,
    /// nothing is forged and [`MiningError::StaleTip`] is returned.
    pub async fn mine(
        &self,
        reward_recipient: &str,
        options: &MiningOptions,
    ) -> Result<Block, MiningError> {
        let tip = self.last_block();
        let search = ProofSearch::new(self.config.difficulty.clone()).with_options(options);
        tracing::info!(index = tip.index + 1, last_proof = tip.proof, "mining");

        let proof = mine_off_thread(search, tip.proof).await?;

        let mut state = self.state.write();
        let current = state.chain.tip();
        if current.index != tip.index || current.proof != tip.proof {
            tracing::warn!(expected = tip.index, found = current.index, "tip moved while mining");
            return Err(MiningError::StaleTip {
                expected: tip.index,
                found: current.index,
            });
        }

        state.pool.push(Transaction::mining_reward(reward_recipient));
        let transactions = state.pool.drain();
        let block = state.chain.forge(proof, None, transactions, now_millis());
        tracing::info!(
            index = block.index,
            proof = block.proof,
            tx_count = block.tx_count(),
            "new block forged"
        );
        Ok(block)
    }

    // -- Peers ---------------------------------------------------------------

    /// Registers a peer by address. Returns its canonical `host[:port]`.
    pub fn register_node(&self, address: &str) -> Result<String, RegistryError> {
        self.registry.register(address)
    }

    /// Registers every address, or none of them if any is invalid.
    pub fn register_nodes<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Vec<String>, RegistryError> {
        self.registry.register_all(addresses)
    }

    /// Number of registered peers.
    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    /// Snapshot of the registered peers.
    pub fn nodes(&self) -> BTreeSet<String> {
        self.registry.nodes()
    }

    /// Adopts the longest valid peer chain if it is strictly longer than ours.
    ///
    /// Returns `true` if the local chain was replaced. Unreachable or invalid
    /// peers are skipped, so this never fails.
    pub async fn resolve_conflicts(&self) -> bool {
        let peers = self.registry.nodes();
        if peers.is_empty() {
            tracing::debug!("no peers registered, nothing to resolve");
            return false;
        }

        let local_len = self.chain_len();
        let candidate = find_longest_chain(
            self.client.as_ref(),
            &peers,
            local_len,
            &self.config.difficulty,
            self.config.peer_timeout,
        )
        .await;

        let Some(candidate) = candidate else {
            tracing::info!(length = local_len, "local chain is authoritative");
            return false;
        };

        let mut state = self.state.write();
        if candidate.chain.len() <= state.chain.len() {
            tracing::info!(
                candidate = candidate.chain.len(),
                local = state.chain.len(),
                "local chain grew during resolution, keeping it"
            );
            return false;
        }
        let Some(chain) = Chain::from_blocks(candidate.chain) else {
            return false;
        };

        tracing::info!(node = %candidate.host, length = chain.len(), "replacing chain");
        state.chain.replace(chain);
        true
    }

    // -- Configuration -------------------------------------------------------

    /// The difficulty proofs are checked against.
    pub fn difficulty(&self) -> &Difficulty {
        &self.config.difficulty
    }

    /// The configuration this ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Weak;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::network::transport::{ChainResponse, TransportError};

    struct NoPeers;

    #[async_trait]
    impl PeerClient for NoPeers {
        async fn fetch_chain(&self, host: &str) -> Result<ChainResponse, TransportError> {
            Err(TransportError::Request {
                host: host.to_string(),
                reason: "offline".into(),
            })
        }
    }

    /// Serves `chain`, but first grows the local ledger to the same length,
    /// as if blocks were mined while the fetch was in flight.
    struct RacingPeer {
        local: parking_lot::Mutex<Weak<Ledger>>,
        chain: Vec<Block>,
    }

    #[async_trait]
    impl PeerClient for RacingPeer {
        async fn fetch_chain(&self, host: &str) -> Result<ChainResponse, TransportError> {
            let local = self.local.lock().upgrade();
            if let Some(local) = local {
                while local.chain_len() < self.chain.len() {
                    let proof = local.proof_of_work(local.last_block().proof);
                    local.create_block(proof, None);
                }
            }
            tracing::debug!(host, "serving chain");
            Ok(ChainResponse::new(self.chain.clone()))
        }
    }

    fn easy_ledger() -> Ledger {
        let config = LedgerConfig {
            difficulty: Difficulty::new("0").unwrap(),
            peer_timeout: Duration::from_millis(200),
        };
        Ledger::new(config, Arc::new(NoPeers))
    }

    fn forge_next(ledger: &Ledger) -> Block {
        let proof = ledger.proof_of_work(ledger.last_block().proof);
        ledger.create_block(proof, None)
    }

    #[test]
    fn fresh_ledger_has_genesis_only() {
        let ledger = easy_ledger();
        let chain = ledger.chain();
        assert_eq!(chain.len(), 1);
        assert!(chain[0].is_genesis());
        assert_eq!(ledger.last_block(), chain[0]);
        assert!(ledger.nodes().is_empty());
    }

    #[test]
    fn first_transaction_lands_in_block_two() {
        let ledger = easy_ledger();
        assert_eq!(ledger.create_transaction(Transaction::new("a", "b", 1)), 2);
        assert_eq!(ledger.create_transaction(Transaction::new("a", "b", 1)), 2);
        assert_eq!(ledger.pending_transactions().len(), 2);
    }

    #[test]
    fn create_block_drains_pool() {
        let ledger = easy_ledger();
        ledger.create_transaction(Transaction::new("alice", "bob", 3));
        ledger.create_transaction(Transaction::new("bob", "carol", 1));

        let block = forge_next(&ledger);
        assert_eq!(block.index, 2);
        assert_eq!(block.tx_count(), 2);
        assert_eq!(block.transactions[0].sender, "alice");
        assert!(ledger.pending_transactions().is_empty());
        assert_eq!(ledger.create_transaction(Transaction::new("c", "d", 1)), 3);
    }

    #[test]
    fn create_block_links_to_previous_hash() {
        let ledger = easy_ledger();
        let genesis = ledger.last_block();
        let block = forge_next(&ledger);
        assert_eq!(block.previous_hash, Ledger::hash(&genesis));
        assert!(ledger.is_valid_proof(genesis.proof, block.proof));
    }

    #[test]
    fn forged_chain_validates() {
        let ledger = easy_ledger();
        for i in 0..5 {
            ledger.create_transaction(Transaction::new("alice", "bob", i));
            forge_next(&ledger);
        }
        assert_eq!(ledger.chain_len(), 6);
        assert!(ledger.is_valid_chain(&ledger.chain()));
    }

    #[test]
    fn explicit_previous_hash_is_kept() {
        let ledger = easy_ledger();
        let block = ledger.create_block(0, Some("cafe".into()));
        assert_eq!(block.previous_hash, "cafe");
        assert!(!ledger.is_valid_chain(&ledger.chain()));
    }

    #[test]
    fn register_node_surfaces_invalid_address() {
        let ledger = easy_ledger();
        assert_eq!(
            ledger.register_node("http://localhost:5001/").unwrap(),
            "localhost:5001"
        );
        assert!(matches!(
            ledger.register_node("http://"),
            Err(RegistryError::InvalidAddress(_))
        ));
        assert_eq!(ledger.nodes().len(), 1);
    }

    #[tokio::test]
    async fn resolve_without_peers_is_false() {
        let ledger = easy_ledger();
        let before = ledger.chain();
        assert!(!ledger.resolve_conflicts().await);
        assert_eq!(ledger.chain(), before);
    }

    #[tokio::test]
    async fn resolve_with_unreachable_peers_is_false() {
        let ledger = easy_ledger();
        ledger.register_node("http://localhost:5001").unwrap();
        forge_next(&ledger);
        let before = ledger.chain();
        assert!(!ledger.resolve_conflicts().await);
        assert_eq!(ledger.chain(), before);
    }

    #[tokio::test]
    async fn chain_grown_during_resolution_is_kept() {
        let source = easy_ledger();
        for _ in 0..2 {
            forge_next(&source);
        }
        let peer = Arc::new(RacingPeer {
            local: parking_lot::Mutex::new(Weak::new()),
            chain: source.chain(),
        });
        let ledger = Arc::new(Ledger::new(easy_ledger().config().clone(), peer.clone()));
        *peer.local.lock() = Arc::downgrade(&ledger);
        ledger.register_node("peer:5000").unwrap();

        assert!(!ledger.resolve_conflicts().await);
        let chain = ledger.chain();
        assert_eq!(chain.len(), 3);
        assert_ne!(chain, source.chain());
        assert!(ledger.is_valid_chain(&chain));
    }

    #[test]
    fn pending_len_tracks_pool() {
        let ledger = easy_ledger();
        assert_eq!(ledger.pending_len(), 0);
        ledger.create_transaction(Transaction::new("a", "b", 1));
        ledger.create_transaction(Transaction::new("b", "c", 2));
        assert_eq!(ledger.pending_len(), 2);
        forge_next(&ledger);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn single_and_batch_registration_agree() {
        let single = easy_ledger();
        let batch = easy_ledger();
        let single_host = single.register_node("https://node:80").unwrap();
        let batch_hosts = batch.register_nodes(&["https://node:80"]).unwrap();
        assert_eq!(batch_hosts, vec![single_host]);
        assert_eq!(single.nodes(), batch.nodes());
        assert_eq!(batch.node_count(), 1);
    }

    #[tokio::test]
    async fn mine_forges_block_with_reward() {
        let ledger = easy_ledger();
        ledger.create_transaction(Transaction::new("alice", "bob", 5));

        let block = ledger.mine("node-1", &MiningOptions::default()).await.unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(block.tx_count(), 2);
        assert_eq!(block.transactions[1], Transaction::mining_reward("node-1"));
        assert!(ledger.pending_transactions().is_empty());
        assert!(ledger.is_valid_chain(&ledger.chain()));
    }

    #[tokio::test]
    async fn cancelled_mining_forges_nothing() {
        let config = LedgerConfig {
            difficulty: Difficulty::new("f".repeat(64)).unwrap(),
            ..LedgerConfig::default()
        };
        let ledger = Ledger::new(config, Arc::new(NoPeers));
        let options = MiningOptions {
            cancel: Some(Arc::new(AtomicBool::new(true))),
            timeout: None,
        };
        let err = ledger.mine("node-1", &options).await.unwrap_err();
        assert!(matches!(err, MiningError::Cancelled { .. }));
        assert_eq!(ledger.chain_len(), 1);
    }

    #[tokio::test]
    async fn mining_timeout_is_reported() {
        let config = LedgerConfig {
            difficulty: Difficulty::new("f".repeat(64)).unwrap(),
            ..LedgerConfig::default()
        };
        let ledger = Ledger::new(config, Arc::new(NoPeers));
        let options = MiningOptions {
            cancel: None,
            timeout: Some(Duration::from_millis(20)),
        };
        let err = ledger.mine("node-1", &options).await.unwrap_err();
        assert!(matches!(err, MiningError::TimedOut { .. }));
    }
}
