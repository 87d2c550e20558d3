use kart_core::{Product, ViewState};

/// One line per product: `name | category | cost | rating/5`
pub fn product_line(product: &Product) -> String {
    format!(
        "{} | {} | {} | {}/5",
        product.name,
        product.category,
        format_cost(product.cost),
        product.rating.min(5)
    )
}

fn format_cost(cost: f64) -> String {
    if cost.fract() == 0.0 {
        format!("{cost:.0}")
    } else {
        format!("{cost:.2}")
    }
}

/// Lines for stdout describing a settled state. Empty for transient states.
pub fn state_lines(state: &ViewState) -> Vec<String> {
    match state {
        ViewState::Idle | ViewState::Loading => Vec::new(),
        ViewState::Loaded(products) if products.is_empty() => vec!["No products found".to_string()],
        ViewState::Loaded(products) => products.iter().map(product_line).collect(),
        ViewState::Failed(_) => vec!["No products found".to_string()],
    }
}

pub fn print_state(state: &ViewState) {
    match state {
        ViewState::Loading => eprintln!("Loading products..."),
        ViewState::Failed(e) => eprintln!("kart: {}", e.user_message()),
        _ => {}
    }
    for line in state_lines(state) {
        println!("{line}");
    }
}
