use rand::Rng;
use rand::seq::IndexedRandom;

pub const PRODUCTS: [&str; 10] = [
    "Laptop",
    "Smartphone",
    "Tablet",
    "Headphones",
    "Monitor",
    "Keyboard",
    "Mouse",
    "Webcam",
    "Speaker",
    "Charger",
];

const MIN_PRICE: f64 = 10.0;
const MAX_PRICE: f64 = 2000.0;
const MAX_RANDOM_QUANTITY: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub product_name: String,
    pub price: f64,
    pub quantity: u32,
}

/// A plausible order: catalogue product, price rounded to cents, quantity 1-10.
pub fn random_order() -> OrderDraft {
    let mut rng = rand::rng();
    let product = PRODUCTS.choose(&mut rng).copied().unwrap_or(PRODUCTS[0]);
    let price = (rng.random_range(MIN_PRICE..=MAX_PRICE) * 100.0).round() / 100.0;
    OrderDraft {
        product_name: product.to_string(),
        price,
        quantity: rng.random_range(1..=MAX_RANDOM_QUANTITY),
    }
}
