pub struct Account {
    pub id: u64,
    pub owner: Option<Owner>,
}

pub struct Owner {
    pub name: String,
}
