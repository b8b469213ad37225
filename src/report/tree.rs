use std::collections::BTreeMap;

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
    name: String,
    is_dir: bool,
}

impl Node {
    fn insert(&mut self, components: &[&str]) {
        let Some((first, rest)) = components.split_first() else {
            return;
        };
        let is_dir = !rest.is_empty();
        // Directories sort as `name/` so siblings follow full-path order
        let key = if is_dir {
            format!("{first}/")
        } else {
            (*first).to_string()
        };

        let child = self.children.entry(key).or_insert_with(|| Node {
            name: (*first).to_string(),
            is_dir,
            ..Node::default()
        });
        child.insert(rest);
    }

    fn render(&self, prefix: &str, out: &mut Vec<String>) {
        let count = self.children.len();
        for (i, child) in self.children.values().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            let suffix = if child.is_dir { "/" } else { "" };
            out.push(format!("{prefix}{connector}{}{suffix}", child.name));

            if child.is_dir {
                let extension = if last { "    " } else { "│   " };
                child.render(&format!("{prefix}{extension}"), out);
            }
        }
    }
}

/// Render `/`-separated relative paths as an indented tree under `root`
pub fn render_tree<'a>(root: &str, paths: impl IntoIterator<Item = &'a str>) -> String {
    let mut tree = Node::default();
    for path in paths {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        tree.insert(&components);
    }

    let mut lines = vec![format!("{root}/")];
    tree.render("", &mut lines);
    lines.join("\n")
}
