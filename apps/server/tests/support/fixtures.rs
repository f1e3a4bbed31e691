//! CSV row builders for ingestion.

pub trait CsvRow {
    fn to_csv_line(&self) -> String;
}

pub fn to_csv<R: CsvRow>(rows: &[R]) -> String {
    rows.iter().map(|r| r.to_csv_line() + "\n").collect()
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[derive(Debug, Clone)]
pub struct FurnitureRow {
    pub id: i64,
    pub price: i64,
    pub height: i64,
    pub width: i64,
    pub depth: i64,
    pub color: String,
    pub features: String,
    pub kind: String,
    pub popularity: i64,
    pub stock: i64,
}

impl FurnitureRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            price: 5000,
            height: 100,
            width: 60,
            depth: 50,
            color: "black".into(),
            features: String::new(),
            kind: "office".into(),
            popularity: 0,
            stock: 10,
        }
    }

    pub fn price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    pub fn dimensions(mut self, width: i64, height: i64, depth: i64) -> Self {
        self.width = width;
        self.height = height;
        self.depth = depth;
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.into();
        self
    }

    pub fn features(mut self, features: &str) -> Self {
        self.features = features.into();
        self
    }

    pub fn popularity(mut self, popularity: i64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }
}

impl CsvRow for FurnitureRow {
    fn to_csv_line(&self) -> String {
        [
            self.id.to_string(),
            quoted(&format!("chair {}", self.id)),
            quoted("a chair"),
            quoted(&format!("/images/chair/{}.png", self.id)),
            self.price.to_string(),
            self.height.to_string(),
            self.width.to_string(),
            self.depth.to_string(),
            quoted(&self.color),
            quoted(&self.features),
            quoted(&self.kind),
            self.popularity.to_string(),
            self.stock.to_string(),
        ]
        .join(",")
    }
}

#[derive(Debug, Clone)]
pub struct PropertyRow {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub rent: i64,
    pub door_height: i64,
    pub door_width: i64,
    pub features: String,
    pub popularity: i64,
}

impl PropertyRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            latitude: 35.5,
            longitude: 139.5,
            rent: 80000,
            door_height: 100,
            door_width: 100,
            features: String::new(),
            popularity: 0,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn rent(mut self, rent: i64) -> Self {
        self.rent = rent;
        self
    }

    pub fn door(mut self, width: i64, height: i64) -> Self {
        self.door_width = width;
        self.door_height = height;
        self
    }

    pub fn features(mut self, features: &str) -> Self {
        self.features = features.into();
        self
    }

    pub fn popularity(mut self, popularity: i64) -> Self {
        self.popularity = popularity;
        self
    }
}

impl CsvRow for PropertyRow {
    fn to_csv_line(&self) -> String {
        [
            self.id.to_string(),
            quoted(&format!("estate {}", self.id)),
            quoted("an estate"),
            quoted(&format!("/images/estate/{}.png", self.id)),
            quoted("1-1 Chiyoda, Tokyo"),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.rent.to_string(),
            self.door_height.to_string(),
            self.door_width.to_string(),
            quoted(&self.features),
            self.popularity.to_string(),
        ]
        .join(",")
    }
}
