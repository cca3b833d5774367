use geocoin_engine::{Coin, LatLng, PlayerState, VisibleCache};

/// Text stand-in for the map layer: one line per visible cache.
pub(crate) fn cache_lines(visible: &[VisibleCache]) -> Vec<String> {
    if visible.is_empty() {
        return vec!["no caches nearby".to_string()];
    }
    visible
        .iter()
        .map(|view| {
            let center = view.bounds.center();
            format!(
                "cache {} @ ({:.5}, {:.5}) coins:{} [{}]",
                view.cell,
                center.lat,
                center.lng,
                view.cache.len(),
                coin_list(&view.cache.coins)
            )
        })
        .collect()
}

pub(crate) fn inventory_line(player: &PlayerState) -> String {
    let inventory = player.inventory();
    if inventory.is_empty() {
        return "inventory: empty".to_string();
    }
    format!(
        "inventory ({}): {}",
        inventory.len(),
        coin_list(inventory)
    )
}

pub(crate) fn status_line(player: &PlayerState, total_coins: usize, cache_count: usize) -> String {
    format!(
        "at {} | moves:{} | held:{} | caches:{} | coins:{}",
        format_location(player.location()),
        player.move_history().len(),
        player.inventory().len(),
        cache_count,
        total_coins
    )
}

pub(crate) fn format_location(location: LatLng) -> String {
    format!("({:.6}, {:.6})", location.lat, location.lng)
}

fn coin_list(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
