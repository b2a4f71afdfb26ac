use smartstring::alias::String;
use std::collections::HashMap;
use std::slice::Iter;

/// Interning table handing out dense indices in insertion order.
#[derive(Default, Debug, Clone)]
pub struct Symtab {
    map: HashMap<String, usize>,
    vec: Vec<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            vec: Vec::new(),
        }
    }

    pub fn add(&mut self, sym: &str) -> usize {
        if let Some(&idx) = self.map.get(sym) {
            return idx;
        }
        let idx = self.vec.len();
        let owned: String = sym.into();
        self.vec.push(owned.clone());
        self.map.insert(owned, idx);
        idx
    }

    pub fn iter(&self) -> Iter<'_, String> {
        self.vec.iter()
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.map.get(sym).copied()
    }

    pub fn sym(&self, idx: usize) -> Option<&str> {
        self.vec.get(idx).map(|x| x.as_str())
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.vec
    }
}
