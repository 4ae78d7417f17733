use std::collections::HashMap;

use order_book::{BookConfig, Order, OrderBook, Side};
use proptest::prelude::*;

fn order_strategy() -> impl Strategy<Value = (bool, u32, u64, u64)> {
    // (is_buy, price in cents above 90.00, volume, timestamp)
    (any::<bool>(), 0u32..2000, 1u64..20, 0u64..5)
}

fn build(specs: &[(bool, u32, u64, u64)]) -> (OrderBook, HashMap<u64, Order>) {
    let mut book = OrderBook::new(BookConfig::default()).unwrap();
    let mut originals = HashMap::new();
    for (i, &(is_buy, cents, volume, ts)) in specs.iter().enumerate() {
        let side = if is_buy { Side::Buy } else { Side::Sell };
        let price = 90.0 + cents as f64 / 100.0;
        let order = Order::new(i as u32, 0, side, price, volume, ts).with_id(i as u64 + 1);
        originals.insert(order.order_id(), order.clone());
        book.add_order(order);
    }
    (book, originals)
}

proptest! {
    #[test]
    fn executed_volume_never_exceeds_order_volume(specs in prop::collection::vec(order_strategy(), 0..60)) {
        let (mut book, originals) = build(&specs);
        let trades = book.match_orders(0);

        let mut filled: HashMap<u64, u64> = HashMap::new();
        for t in &trades {
            let buy = &originals[&t.buy_order];
            let sell = &originals[&t.sell_order];
            prop_assert!(t.volume > 0);
            prop_assert!(t.price <= buy.price() && t.price >= sell.price());
            *filled.entry(t.buy_order).or_default() += t.volume;
            *filled.entry(t.sell_order).or_default() += t.volume;
        }
        for (id, qty) in &filled {
            prop_assert!(*qty <= originals[id].volume());
        }

        // Whatever rests carries exactly its unfilled volume.
        for o in book.resting_bids().iter().chain(book.resting_asks()) {
            let used = filled.get(&o.order_id()).copied().unwrap_or(0);
            prop_assert_eq!(o.remaining() + used, o.volume());
            prop_assert!(o.remaining() > 0);
        }
    }

    #[test]
    fn book_is_uncrossed_after_matching(specs in prop::collection::vec(order_strategy(), 0..60)) {
        let (mut book, _) = build(&specs);
        book.match_orders(0);
        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            prop_assert!(bid < ask);
        }
        prop_assert!(book.match_orders(1).is_empty());
    }

    #[test]
    fn history_tracks_trades_in_order(specs in prop::collection::vec(order_strategy(), 0..60)) {
        let (mut book, _) = build(&specs);
        let trades = book.match_orders(0);
        let prices: Vec<f64> = trades.iter().map(|t| t.price).collect();
        prop_assert_eq!(book.price_history(), prices.as_slice());
        if let Some(last) = prices.last() {
            prop_assert_eq!(book.last_price(), *last);
        }
        let avg = book.historical_average();
        prop_assert_eq!(avg, book.historical_average());
    }

    #[test]
    fn better_priced_bid_never_rests_while_worse_bid_traded(specs in prop::collection::vec(order_strategy(), 0..60)) {
        let (mut book, originals) = build(&specs);
        let trades = book.match_orders(0);
        let traded_bid_prices: Vec<f64> = trades.iter().map(|t| originals[&t.buy_order].price()).collect();
        if let Some(worst_traded) = traded_bid_prices.iter().copied().reduce(f64::min) {
            for resting in book.resting_bids() {
                let untouched = resting.remaining() == resting.volume();
                if untouched {
                    prop_assert!(resting.price() <= worst_traded);
                }
            }
        }
    }
}
