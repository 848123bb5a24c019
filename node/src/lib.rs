// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(missing_docs)]

//! Provides a tree type for WA protocol stanzas.
//!
//! A [`Node`] is one logical message in the tree protocol: a name, a map of
//! attributes, and either an opaque byte payload or an ordered list of child
//! nodes. The wire format reserves a single trailing slot per node, so a
//! node never carries both a payload and children.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// A stanza node: name, attributes, optional byte payload, ordered children.
///
/// Attributes are kept in a `BTreeMap` so that iteration (and therefore the
/// encoded wire form) is deterministic. Equality ignores the order in which
/// attributes were inserted.
///
/// # Examples
///
/// ```
/// use wa_node::Node;
///
/// let message = Node::builder("message")
///     .attr("type", "text")
///     .attr("to", "15551234567@s.whatsapp.net")
///     .append(Node::builder("body").data(b"hi".to_vec()).build())
///     .build();
///
/// assert_eq!(message.name(), "message");
/// assert_eq!(message.attr("type"), Some("text"));
/// assert!(message.has_child("body"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attrs: BTreeMap<String, String>,
    data: Option<Vec<u8>>,
    children: Vec<Node>,
}

impl Node {
    /// Constructs a node with the given name and nothing else.
    pub fn new<N: Into<String>>(name: N) -> Node {
        Node {
            name: name.into(),
            attrs: BTreeMap::new(),
            data: None,
            children: Vec::new(),
        }
    }

    /// Returns a builder for a node with the given name.
    pub fn builder<N: Into<String>>(name: N) -> NodeBuilder {
        NodeBuilder {
            node: Node::new(name),
        }
    }

    /// The node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Sets an attribute, replacing any previous value for the same key.
    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Iterates over `(name, value)` attribute pairs in key order.
    pub fn attrs(&self) -> Attrs {
        Attrs {
            inner: self.attrs.iter(),
        }
    }

    /// The number of attributes.
    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// The byte payload, if any.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Sets the byte payload.
    pub fn set_data<D: Into<Vec<u8>>>(&mut self, data: D) {
        self.data = Some(data.into());
    }

    /// The byte payload decoded as UTF-8, lossily. Empty for payload-less
    /// nodes. Wire strings are raw bytes; decoding is the caller's concern,
    /// and this is the convenient accessor for fields that are semantically
    /// text (message bodies, nicknames).
    pub fn text(&self) -> String {
        match self.data {
            Some(ref data) => String::from_utf8_lossy(data).into_owned(),
            None => String::new(),
        }
    }

    /// The child nodes, in order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Appends a child node.
    pub fn append_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// The first child with the given name, if any.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Whether a child with the given name exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }
}

/// Iterator over a node's attributes, in key order.
pub struct Attrs<'a> {
    inner: btree_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Attrs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Builder for [`Node`].
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    /// Sets an attribute.
    pub fn attr<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> NodeBuilder {
        self.node.set_attr(name, value);
        self
    }

    /// Sets the byte payload.
    pub fn data<D: Into<Vec<u8>>>(mut self, data: D) -> NodeBuilder {
        self.node.data = Some(data.into());
        self
    }

    /// Appends a child.
    pub fn append(mut self, child: Node) -> NodeBuilder {
        self.node.children.push(child);
        self
    }

    /// Finishes the node.
    pub fn build(self) -> Node {
        self.node
    }
}

/// Renders the node as XML-ish text. This form is for logs and debugging
/// only; the wire form is the binary encoding.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in self.attrs() {
            write!(f, " {}=\"{}\"", name, value)?;
        }
        write!(f, ">")?;
        if let Some(ref data) = self.data {
            write!(f, "{}", String::from_utf8_lossy(data))?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.name)
    }
}
