//! Grouping interacting objects into clusters.
//!
//! A [`ClusterCollector`] is a box scanner receiver. It keeps a union-find
//! structure over the objects it has seen and one caller-defined [`Cluster`]
//! value per group of transitively interacting objects. As soon as the scanner
//! has finished every member of a group, the group's cluster is finished and
//! stored.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tracing::{debug, trace};

use crate::box_scanner::{BoxScannerReceiver, BoxScannerReceiver2};

/// The content of a cluster.
///
/// New clusters are created by cloning the collector's prototype, so `Clone`
/// should be cheap for a fresh cluster.
pub trait Cluster<'a, O: ?Sized, P>: Clone {
    /// Adds an object to this cluster.
    fn add(&mut self, obj: &'a O, prop: &P);

    /// Absorbs another cluster, which is discarded afterwards.
    fn join(&mut self, other: Self);

    /// Called exactly once, when no more objects can join.
    fn finish(&mut self) {}
}

/// A disjoint-set forest with union by rank and path halving.
#[derive(Clone, Debug, Default)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a singleton set, returning its element.
    pub fn push(&mut self) -> usize {
        let idx = self.parent.len();
        self.parent.push(idx);
        self.rank.push(0);
        idx
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Are there no elements?
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// The representative of `x`'s set.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets of `a` and `b`, returning the new representative.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return ra;
        }
        let (winner, loser) = if self.rank[ra] >= self.rank[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[loser] = winner;
        if self.rank[winner] == self.rank[loser] {
            self.rank[winner] += 1;
        }
        winner
    }
}

// Object identity: the object's address plus its property.
type Identity<P> = (usize, P);

fn identity<O: ?Sized, P: Clone>(obj: &O, prop: &P) -> Identity<P> {
    (obj as *const O as *const () as usize, prop.clone())
}

#[derive(Debug)]
struct Node<P> {
    id: Identity<P>,
    finished: bool,
}

#[derive(Debug)]
struct OpenCluster<C> {
    cluster: C,
    members: Vec<usize>,
    pending: usize,
}

/// A box scanner receiver that builds clusters of interacting objects.
pub struct ClusterCollector<'a, O: ?Sized, P, C> {
    prototype: C,
    report_single: bool,
    uf: UnionFind,
    nodes: Vec<Node<P>>,
    ids: HashMap<Identity<P>, usize>,
    open: HashMap<usize, OpenCluster<C>>,
    done: HashSet<Identity<P>>,
    finished: Vec<C>,
    _objects: std::marker::PhantomData<&'a O>,
}

impl<'a, O, P, C> ClusterCollector<'a, O, P, C>
where
    O: ?Sized,
    P: Clone + Eq + Hash,
    C: Cluster<'a, O, P>,
{
    /// Creates a collector; new clusters are clones of `prototype`.
    ///
    /// If `report_single` is false, objects that interact with nothing never
    /// form a cluster.
    pub fn new(prototype: C, report_single: bool) -> Self {
        ClusterCollector {
            prototype,
            report_single,
            uf: UnionFind::new(),
            nodes: Vec::new(),
            ids: HashMap::new(),
            open: HashMap::new(),
            done: HashSet::new(),
            finished: Vec::new(),
            _objects: std::marker::PhantomData,
        }
    }

    /// The clusters finished so far.
    pub fn clusters(&self) -> &[C] {
        &self.finished
    }

    /// The finished clusters, in the order they were finished.
    pub fn into_clusters(self) -> Vec<C> {
        self.finished
    }

    fn new_node(&mut self, id: Identity<P>) -> usize {
        let n = self.uf.push();
        debug_assert_eq!(n, self.nodes.len());
        self.ids.insert(id.clone(), n);
        self.nodes.push(Node {
            id,
            finished: false,
        });
        n
    }

    fn connect(&mut self, o1: &'a O, p1: &P, o2: &'a O, p2: &P) {
        let id1 = identity(o1, p1);
        let id2 = identity(o2, p2);
        if id1 == id2 {
            return;
        }
        debug_assert!(!self.done.contains(&id1) && !self.done.contains(&id2));

        match (self.ids.get(&id1).copied(), self.ids.get(&id2).copied()) {
            (None, None) => {
                let n1 = self.new_node(id1);
                let n2 = self.new_node(id2);
                let root = self.uf.union(n1, n2);
                let mut cluster = self.prototype.clone();
                cluster.add(o1, p1);
                cluster.add(o2, p2);
                self.open.insert(
                    root,
                    OpenCluster {
                        cluster,
                        members: vec![n1, n2],
                        pending: 2,
                    },
                );
            }
            (Some(a), None) => self.attach(a, o2, id2, p2),
            (None, Some(b)) => self.attach(b, o1, id1, p1),
            (Some(a), Some(b)) => {
                let (ra, rb) = (self.uf.find(a), self.uf.find(b));
                if ra == rb {
                    return;
                }
                let root = self.uf.union(ra, rb);
                let loser = if root == ra { rb } else { ra };
                let (Some(absorbed), Some(mut kept)) =
                    (self.open.remove(&loser), self.open.remove(&root))
                else {
                    panic!("interacting objects without an open cluster");
                };
                trace!(root, loser, "joining clusters");
                kept.cluster.join(absorbed.cluster);
                kept.members.extend(absorbed.members);
                kept.pending += absorbed.pending;
                self.open.insert(root, kept);
            }
        }
    }

    fn attach(&mut self, existing: usize, obj: &'a O, id: Identity<P>, prop: &P) {
        let root = self.uf.find(existing);
        let n = self.new_node(id);
        let new_root = self.uf.union(root, n);
        let Some(mut open) = self.open.remove(&root) else {
            panic!("clustered object without an open cluster");
        };
        open.cluster.add(obj, prop);
        open.members.push(n);
        open.pending += 1;
        self.open.insert(new_root, open);
    }

    fn object_finished(&mut self, obj: &'a O, prop: &P) {
        let id = identity(obj, prop);
        let Some(&n) = self.ids.get(&id) else {
            // Either a duplicate insertion of an object whose cluster is
            // already done, or an object without any interactions.
            if self.done.insert(id) && self.report_single {
                let mut cluster = self.prototype.clone();
                cluster.add(obj, prop);
                cluster.finish();
                self.finished.push(cluster);
            }
            return;
        };
        if self.nodes[n].finished {
            return;
        }
        self.nodes[n].finished = true;

        let root = self.uf.find(n);
        let Some(open) = self.open.get_mut(&root) else {
            panic!("finished object without an open cluster");
        };
        open.pending -= 1;
        if open.pending == 0 {
            if let Some(mut open) = self.open.remove(&root) {
                // Forget the members, so that duplicate insertions finishing
                // later don't start new clusters.
                for m in &open.members {
                    let id = &self.nodes[*m].id;
                    self.ids.remove(id);
                    self.done.insert(id.clone());
                }
                open.cluster.finish();
                self.finished.push(open.cluster);
            }
        }
    }

    fn wrap_up(&mut self, aborted: bool) {
        if aborted {
            debug!(
                unfinished = self.open.len(),
                "cluster collection aborted, dropping open clusters"
            );
            self.open.clear();
        } else {
            debug_assert!(self.open.is_empty(), "clusters left open after a full scan");
        }
        debug!(clusters = self.finished.len(), "cluster collection done");
    }
}

impl<'a, O, P, C> BoxScannerReceiver<'a, O, P> for ClusterCollector<'a, O, P, C>
where
    O: ?Sized,
    P: Clone + Eq + Hash,
    C: Cluster<'a, O, P>,
{
    fn add(&mut self, o1: &'a O, p1: &P, o2: &'a O, p2: &P) {
        self.connect(o1, p1, o2, p2);
    }

    fn finish(&mut self, obj: &'a O, prop: &P) {
        self.object_finished(obj, prop);
    }

    fn finalize(&mut self, aborted: bool) {
        self.wrap_up(aborted);
    }
}

impl<'a, O, P, C> BoxScannerReceiver2<'a, O, P, O, P> for ClusterCollector<'a, O, P, C>
where
    O: ?Sized,
    P: Clone + Eq + Hash,
    C: Cluster<'a, O, P>,
{
    fn add(&mut self, o1: &'a O, p1: &P, o2: &'a O, p2: &P) {
        self.connect(o1, p1, o2, p2);
    }

    fn finish1(&mut self, obj: &'a O, prop: &P) {
        self.object_finished(obj, prop);
    }

    fn finish2(&mut self, obj: &'a O, prop: &P) {
        self.object_finished(obj, prop);
    }

    fn finalize(&mut self, aborted: bool) {
        self.wrap_up(aborted);
    }
}
