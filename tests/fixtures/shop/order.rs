use chrono::NaiveDate;

pub struct Order {
    pub id: u64,
    pub customer: Option<customer::Customer>,
    pub placed_at: chrono::NaiveDate,
}
