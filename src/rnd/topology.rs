//! Topology generators.
//!
//! Each generator produces the channel list of one subnetwork over local node
//! indices. Same-layer models work on `0..n`; bipartite models number the "up"
//! nodes `0..n_up` and the "down" nodes `n_up..n_up + n_down`. Channels are
//! numbered by their position in the returned list.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::error::GeneratorError;
use crate::model::types::TopologyModel;
use crate::rnd::distributions::lognormal_set_partition;

/// Simple undirected graph over `0..n`, used while drawing random topologies
#[derive(Debug, Clone, Default)]
pub struct UndirectedGraph {
    adj: Vec<BTreeSet<usize>>,
}

impl UndirectedGraph {
    pub fn new(n: usize) -> Self {
        Self {
            adj: vec![BTreeSet::new(); n],
        }
    }

    pub fn complete(n: usize) -> Self {
        let mut graph = Self::new(n);
        for u in 0..n {
            for v in (u + 1)..n {
                graph.add_edge(u, v);
            }
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    pub fn add_edge(&mut self, u: usize, v: usize) {
        if u != v {
            self.adj[u].insert(v);
            self.adj[v].insert(u);
        }
    }

    pub fn remove_edge(&mut self, u: usize, v: usize) {
        self.adj[u].remove(&v);
        self.adj[v].remove(&u);
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj[u].contains(&v)
    }

    pub fn degree(&self, u: usize) -> usize {
        self.adj[u].len()
    }

    /// Edges as `(u, v)` with `u < v`, in ascending order
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, neighbours)| neighbours.range((u + 1)..).map(move |&v| (u, v)))
            .collect()
    }
}

/// Every unordered pair of the `n` nodes
pub fn clique(n: usize) -> Vec<(usize, usize)> {
    UndirectedGraph::complete(n).edges()
}

/// Watts–Strogatz small-world graph.
///
/// Each node is joined to its `k / 2` neighbours on each side of a ring, then
/// every lattice edge `(u, v)` is replaced by `(u, w)` with probability `p`,
/// `w` chosen uniformly among the nodes not already adjacent to `u`. A `k` of
/// `n` or more yields the complete graph.
pub fn watts_strogatz<R: Rng + ?Sized>(n: usize, k: usize, p: f64, rng: &mut R) -> Vec<(usize, usize)> {
    if k >= n {
        return clique(n);
    }
    let mut graph = UndirectedGraph::new(n);
    let nodes: Vec<usize> = (0..n).collect();
    for j in 1..=(k / 2) {
        for u in 0..n {
            graph.add_edge(u, (u + j) % n);
        }
    }
    for j in 1..=(k / 2) {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.gen::<f64>() >= p {
                continue;
            }
            let mut rewired = true;
            let mut w = *nodes.choose(rng).unwrap_or(&u);
            while w == u || graph.has_edge(u, w) {
                w = *nodes.choose(rng).unwrap_or(&u);
                if graph.degree(u) >= n - 1 {
                    rewired = false;
                    break;
                }
            }
            if rewired {
                graph.remove_edge(u, v);
                graph.add_edge(u, w);
            }
        }
    }
    graph.edges()
}

/// Every unordered pair kept independently with probability `p`
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.gen::<f64>() < p {
                edges.push((u, v));
            }
        }
    }
    edges
}

/// Every down node attached to the up node owning its lognormal group
pub fn bipartite_lognormal_partition<R: Rng + ?Sized>(
    n_up: usize,
    n_down: usize,
    mean: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<(usize, usize)>, GeneratorError> {
    let down: Vec<usize> = (n_up..n_up + n_down).collect();
    let groups = lognormal_set_partition(&down, n_up, mean, sigma, rng)?;
    Ok(groups
        .into_iter()
        .enumerate()
        .flat_map(|(up, group)| group.into_iter().map(move |d| (up, d)))
        .collect())
}

/// Every (up, down) pair kept independently with probability `p`
pub fn bipartite_erdos_renyi<R: Rng + ?Sized>(n_up: usize, n_down: usize, p: f64, rng: &mut R) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for up in 0..n_up {
        for down in n_up..n_up + n_down {
            if rng.gen::<f64>() < p {
                edges.push((up, down));
            }
        }
    }
    edges
}

/// Draw the channels of a subnetwork for the given group sizes.
///
/// Same-layer models pool all `counts`; bipartite models take the first count
/// as the up side and pool the rest as the down side.
pub fn generate_topology<R: Rng + ?Sized>(
    model: &TopologyModel,
    counts: &[usize],
    rng: &mut R,
) -> Result<Vec<(usize, usize)>, GeneratorError> {
    model.validate()?;
    let total: usize = counts.iter().sum();
    let (n_up, n_down) = match counts.split_first() {
        Some((up, rest)) => (*up, rest.iter().sum::<usize>()),
        None => (0, 0),
    };

    let edges = match model {
        TopologyModel::Empty => Vec::new(),
        TopologyModel::Clique => clique(total),
        TopologyModel::WattsStrogatz { k, p } => watts_strogatz(total, *k, *p, rng),
        TopologyModel::ErdosRenyi { p } => erdos_renyi(total, *p, rng),
        TopologyModel::BipartiteLognormalPartition { mean, sigma } => {
            bipartite_lognormal_partition(n_up, n_down, *mean, *sigma, rng)?
        }
        TopologyModel::BipartiteErdosRenyi { p } => bipartite_erdos_renyi(n_up, n_down, *p, rng),
    };
    debug!("{} over {:?} nodes produced {} channels", model.name(), counts, edges.len());
    Ok(edges)
}
