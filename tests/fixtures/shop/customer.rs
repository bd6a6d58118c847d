pub struct Customer {
    pub name: String,
    pub email: String,
}
