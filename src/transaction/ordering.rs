// src/transaction/ordering.rs

//! In-memory ordering transaction set
//!
//! Every requirement of a submitted header becomes an edge from the first
//! submitted header that provides it to the requiring header. The set is
//! then ordered with Kahn's algorithm, breaking ties by submission order.
//!
//! Cycles are broken the way rpm prefers: ordinary requirement edges inside
//! a strongly connected component are dropped first. Pre-requirement edges
//! are only dropped when a cycle consists of nothing else.

use super::{InstallMode, TransactionOrderer};
use crate::dependency::DependencySpecifier;
use crate::error::{Error, Result};
use crate::header::ReducedHeader;
use rpm::DependencyFlags;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Element {
    key: String,
    header: ReducedHeader,
    mode: InstallMode,
}

/// A dependency edge: `from` must be installed before `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    from: usize,
    to: usize,
    prereq: bool,
}

/// Transaction orderer over reduced headers
#[derive(Debug, Default)]
pub struct OrderingTransactionSet {
    elements: Vec<Element>,
    ordered: Option<Vec<usize>>,
}

impl OrderingTransactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered.is_some()
    }

    /// Header submitted under `key`
    pub fn header(&self, key: &str) -> Option<&ReducedHeader> {
        self.elements
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.header)
    }

    /// NEVRAs of the submitted headers, in install order once ordered
    pub fn nevras(&self) -> Vec<String> {
        match &self.ordered {
            Some(order) => order.iter().map(|&i| self.elements[i].header.nevra()).collect(),
            None => self.elements.iter().map(|e| e.header.nevra()).collect(),
        }
    }

    /// Mode the element under `key` was submitted with
    pub fn mode(&self, key: &str) -> Option<InstallMode> {
        self.elements.iter().find(|e| e.key == key).map(|e| e.mode)
    }

    fn element_provides(element: &Element, want: &DependencySpecifier) -> bool {
        let header = &element.header;
        if header.name == want.name {
            let own = DependencySpecifier::from_entry(
                &header.name,
                &format_header_evr(header),
                DependencyFlags::EQUAL,
            );
            if want.is_satisfied_by(&own) {
                return true;
            }
        }

        header.provide_entries().any(|(name, version, flags)| {
            name == want.name && want.is_satisfied_by(&DependencySpecifier::from_entry(name, version, flags))
        })
    }

    /// Collect requirement edges between submitted elements
    fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();

        for (to, element) in self.elements.iter().enumerate() {
            for (name, version, flags) in element.header.require_entries() {
                if flags.contains(DependencyFlags::RPMLIB) {
                    continue;
                }
                let want = DependencySpecifier::from_entry(name, version, flags);

                // A package satisfying its own requirement adds no edge
                if Self::element_provides(element, &want) {
                    continue;
                }

                let provider = self
                    .elements
                    .iter()
                    .enumerate()
                    .find(|(i, other)| *i != to && Self::element_provides(other, &want));

                match provider {
                    Some((from, other)) => {
                        let prereq = flags.contains(DependencyFlags::PREREQ);
                        debug!(
                            "{} -> {} ({}{})",
                            other.key,
                            element.key,
                            want,
                            if prereq { ", prereq" } else { "" }
                        );
                        edges.push(Edge { from, to, prereq });
                    }
                    None => debug!(
                        "'{}' of {} is not provided inside the transaction",
                        want, element.key
                    ),
                }
            }
        }

        edges
    }
}

fn format_header_evr(header: &ReducedHeader) -> String {
    crate::packages::record::format_evr(&header.epoch, &header.version, &header.release)
}

/// Kahn ordering state
struct Sorter {
    edges: Vec<Edge>,
    active: Vec<bool>,
    in_degree: Vec<usize>,
    outgoing: Vec<Vec<usize>>,
    done: Vec<bool>,
    ready: BTreeSet<usize>,
}

impl Sorter {
    fn new(count: usize, edges: Vec<Edge>) -> Self {
        let mut in_degree = vec![0; count];
        let mut outgoing = vec![Vec::new(); count];
        for (i, edge) in edges.iter().enumerate() {
            in_degree[edge.to] += 1;
            outgoing[edge.from].push(i);
        }
        let ready = (0..count).filter(|&n| in_degree[n] == 0).collect();

        Self {
            active: vec![true; edges.len()],
            edges,
            in_degree,
            outgoing,
            done: vec![false; count],
            ready,
        }
    }

    fn deactivate(&mut self, edge: usize) {
        if self.active[edge] {
            self.active[edge] = false;
            let to = self.edges[edge].to;
            self.in_degree[to] -= 1;
            if self.in_degree[to] == 0 && !self.done[to] {
                self.ready.insert(to);
            }
        }
    }

    fn run(mut self, keys: &[&str]) -> Vec<usize> {
        let count = self.done.len();
        let mut order = Vec::with_capacity(count);

        while order.len() < count {
            if let Some(next) = self.ready.pop_first() {
                self.done[next] = true;
                order.push(next);
                for edge in self.outgoing[next].clone() {
                    self.deactivate(edge);
                }
                continue;
            }
            self.break_cycles(keys);
        }

        order
    }

    /// Relax edges inside strongly connected components of the
    /// remaining graph
    fn break_cycles(&mut self, keys: &[&str]) {
        let components = self.components();

        let mut relaxed = false;
        for component in &components {
            let members: HashSet<usize> = component.iter().copied().collect();
            for i in 0..self.edges.len() {
                let edge = self.edges[i];
                if self.active[i]
                    && !edge.prereq
                    && members.contains(&edge.from)
                    && members.contains(&edge.to)
                {
                    debug!(
                        "Breaking loop edge {} -> {}",
                        keys[edge.from], keys[edge.to]
                    );
                    self.deactivate(i);
                    relaxed = true;
                }
            }
        }

        if relaxed {
            return;
        }

        // Only pre-requirement loops remain: release the earliest submitted
        // member of the first loop
        let victim = components
            .iter()
            .filter_map(|c| c.iter().min().copied())
            .min()
            .or_else(|| (0..self.done.len()).find(|&n| !self.done[n]));

        if let Some(victim) = victim {
            warn!("Pre-requirement loop: installing {} early", keys[victim]);
            for i in 0..self.edges.len() {
                if self.edges[i].to == victim {
                    self.deactivate(i);
                }
            }
        }
    }

    /// Strongly connected components with more than one member, over
    /// active edges between unfinished nodes
    fn components(&self) -> Vec<Vec<usize>> {
        let count = self.done.len();
        let mut adj = vec![Vec::new(); count];
        for (i, edge) in self.edges.iter().enumerate() {
            if self.active[i] && !self.done[edge.from] && !self.done[edge.to] {
                adj[edge.from].push(edge.to);
            }
        }

        let mut tarjan = Tarjan::new(&adj);
        for node in 0..count {
            if !self.done[node] && tarjan.index[node].is_none() {
                tarjan.visit(node);
            }
        }

        let mut components: Vec<Vec<usize>> = tarjan
            .components
            .into_iter()
            .filter(|c| c.len() > 1)
            .collect();
        for c in &mut components {
            c.sort_unstable();
        }
        components.sort();
        components
    }
}

struct Tarjan<'a> {
    adj: &'a [Vec<usize>],
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next: usize,
    components: Vec<Vec<usize>>,
}

impl<'a> Tarjan<'a> {
    fn new(adj: &'a [Vec<usize>]) -> Self {
        let n = adj.len();
        Self {
            adj,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next: 0,
            components: Vec::new(),
        }
    }

    fn visit(&mut self, v: usize) {
        self.index[v] = Some(self.next);
        self.low[v] = self.next;
        self.next += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let adj = self.adj;
        for &w in &adj[v] {
            match self.index[w] {
                None => {
                    self.visit(w);
                    self.low[v] = self.low[v].min(self.low[w]);
                }
                Some(iw) if self.on_stack[w] => {
                    self.low[v] = self.low[v].min(iw);
                }
                Some(_) => {}
            }
        }

        if Some(self.low[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

impl TransactionOrderer for OrderingTransactionSet {
    fn add_install(&mut self, header: ReducedHeader, key: &str, mode: InstallMode) -> Result<()> {
        if self.ordered.is_some() {
            return Err(Error::Ordering(format!(
                "cannot add {} after the transaction was ordered",
                key
            )));
        }
        if self.elements.iter().any(|e| e.key == key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }

        debug!("Adding {} ({}) as '{}'", header.nevra(), mode.code(), key);
        self.elements.push(Element {
            key: key.to_string(),
            header,
            mode,
        });
        Ok(())
    }

    fn order(&mut self) -> Result<()> {
        if self.ordered.is_some() {
            return Err(Error::Ordering("transaction is already ordered".to_string()));
        }

        let edges = self.edges();
        let keys: Vec<&str> = self.elements.iter().map(|e| e.key.as_str()).collect();
        info!(
            "Ordering {} elements over {} dependency edges",
            keys.len(),
            edges.len()
        );

        let order = Sorter::new(self.elements.len(), edges).run(&keys);
        self.ordered = Some(order);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        match &self.ordered {
            Some(order) => order.iter().map(|&i| self.elements[i].key.clone()).collect(),
            None => self.elements.iter().map(|e| e.key.clone()).collect(),
        }
    }
}
