use crate::core::ids::UserId;

pub struct GraphBuilder {
    node_count: usize,
    srcs: Vec<UserId>,
    dsts: Vec<UserId>,
    weights: Vec<f32>,
}

impl GraphBuilder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            srcs: vec![],
            dsts: vec![],
            weights: vec![],
        }
    }

    pub fn add_edge(&mut self, src: UserId, dst: UserId, weight: f32) {
        self.node_count = self.node_count.max(src.max(dst) as usize + 1);
        self.srcs.push(src);
        self.dsts.push(dst);
        self.weights.push(weight);
    }

    pub fn grow_to(&mut self, node_count: usize) {
        self.node_count = self.node_count.max(node_count);
    }

    pub fn freeze(self) -> Graph {
        let mut graph = Graph::new(self.node_count);
        graph.srcs_out = self.srcs;
        graph.dsts = self.dsts;
        graph.weights_out = self.weights;
        if graph.edge_count() == 0 {
            return graph;
        }

        let mut buf = vec![0; graph.node_count];

        // store number of edges per dst node
        for dst in &graph.dsts {
            buf[*dst as usize] += 1;
        }

        // compute edge offsets per dst node
        let mut next = 0;
        for (i, edges) in buf.iter().enumerate() {
            graph.offsets_in[i] = next;
            next += edges;
            graph.offsets_in[i + 1] = next;
        }

        buf.fill(0);
        graph.srcs_in = vec![0; graph.edge_count()];
        graph.weights_in = vec![0.0; graph.edge_count()];
        for e in 0..graph.edge_count() {
            let dst = graph.dsts[e] as usize;
            let idx = graph.offsets_in[dst] + buf[dst];
            graph.srcs_in[idx] = graph.srcs_out[e];
            graph.weights_in[idx] = graph.weights_out[e];
            buf[dst] += 1;
        }

        buf.fill(0);
        // store number of edges per src node
        for src in &graph.srcs_out {
            buf[*src as usize] += 1;
        }

        // compute edge offsets per source node
        next = 0;
        for (i, edges) in buf.iter().enumerate() {
            graph.offsets_out[i] = next;
            next += edges;
            graph.offsets_out[i + 1] = next;
        }

        // stable placement by source, insertion order kept within a node
        buf.fill(0);
        let mut srcs = vec![0; graph.edge_count()];
        let mut dsts = vec![0; graph.edge_count()];
        let mut weights = vec![0.0; graph.edge_count()];
        for e in 0..graph.edge_count() {
            let src = graph.srcs_out[e] as usize;
            let idx = graph.offsets_out[src] + buf[src];
            srcs[idx] = graph.srcs_out[e];
            dsts[idx] = graph.dsts[e];
            weights[idx] = graph.weights_out[e];
            buf[src] += 1;
        }
        graph.srcs_out = srcs;
        graph.dsts = dsts;
        graph.weights_out = weights;

        graph
    }
}

/// Compressed adjacency (CSR) over dense user ids, indexed both by source
/// and by destination.
pub struct Graph {
    node_count: usize,
    srcs_out: Vec<UserId>,
    srcs_in: Vec<UserId>,
    dsts: Vec<UserId>,
    weights_out: Vec<f32>,
    weights_in: Vec<f32>,
    offsets_out: Vec<usize>,
    offsets_in: Vec<usize>,
}

impl Graph {
    fn new(node_count: usize) -> Self {
        Self {
            node_count,
            srcs_out: vec![],
            srcs_in: vec![],
            dsts: vec![],
            weights_out: vec![],
            weights_in: vec![],
            offsets_out: vec![0; node_count + 1],
            offsets_in: vec![0; node_count + 1],
        }
    }

    pub fn edge_count(&self) -> usize {
        self.srcs_out.len()
    }

    pub fn edges_from(&'_ self, src: UserId) -> OutgoingEdgeIter<'_> {
        OutgoingEdgeIter::new(self, src)
    }

    pub fn edges_to(&'_ self, dst: UserId) -> IncomingEdgeIter<'_> {
        IncomingEdgeIter::new(self, dst)
    }

    /// Neighbours reached in either direction.
    pub fn neighbors(&self, node: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.edges_from(node)
            .map(|e| e.dst)
            .chain(self.edges_to(node).map(|e| e.src))
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn in_degree(&self, dst: UserId) -> usize {
        let dst = dst as usize;
        if dst >= self.node_count {
            return 0;
        }
        self.offsets_in[dst + 1] - self.offsets_in[dst]
    }

    pub fn out_degree(&self, src: UserId) -> usize {
        let src = src as usize;
        if src >= self.node_count {
            return 0;
        }
        self.offsets_out[src + 1] - self.offsets_out[src]
    }

    pub fn degree(&self, node: UserId) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }
}

fn bounds(offsets: &[usize], node_id: UserId) -> (usize, usize) {
    let node = node_id as usize;
    match (offsets.get(node), offsets.get(node + 1)) {
        (Some(start), Some(end)) => (*start, *end),
        _ => (0, 0),
    }
}

pub struct IncomingEdgeIter<'a> {
    graph: &'a Graph,
    next: usize,
    end: usize,
}

impl<'a> IncomingEdgeIter<'a> {
    pub fn new(graph: &'a Graph, node_id: UserId) -> Self {
        let (start, end) = bounds(&graph.offsets_in, node_id);
        Self {
            graph,
            next: start,
            end,
        }
    }
}

impl Iterator for IncomingEdgeIter<'_> {
    type Item = IncomingEdgeRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.end {
            let result = Some(IncomingEdgeRef::new(
                self.graph.srcs_in[self.next],
                self.graph.weights_in[self.next],
            ));
            self.next += 1;
            result
        } else {
            None
        }
    }
}

pub struct OutgoingEdgeIter<'a> {
    graph: &'a Graph,
    next: usize,
    end: usize,
}

impl<'a> OutgoingEdgeIter<'a> {
    pub fn new(graph: &'a Graph, node_id: UserId) -> Self {
        let (start, end) = bounds(&graph.offsets_out, node_id);
        Self {
            graph,
            next: start,
            end,
        }
    }
}

impl Iterator for OutgoingEdgeIter<'_> {
    type Item = OutgoingEdgeRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.end {
            let result = Some(OutgoingEdgeRef::new(
                self.graph.dsts[self.next],
                self.graph.weights_out[self.next],
            ));
            self.next += 1;
            result
        } else {
            None
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct OutgoingEdgeRef {
    pub dst: UserId,
    pub weight: f32,
}

impl OutgoingEdgeRef {
    pub fn new(dst: UserId, weight: f32) -> Self {
        Self { dst, weight }
    }
}

#[derive(Debug, PartialEq)]
pub struct IncomingEdgeRef {
    pub src: UserId,
    pub weight: f32,
}

impl IncomingEdgeRef {
    pub fn new(src: UserId, weight: f32) -> Self {
        Self { src, weight }
    }
}
