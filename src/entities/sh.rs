//! Sales History (SH) sample schema.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Entity;

macro_rules! entity {
    ($ty:ty, $name:literal) => {
        impl Entity for $ty {
            const NAME: &'static str = $name;
        }
    };
}

/// Small dimension table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Channel {
    pub channel_id: i32,
    pub channel_desc: String,
    pub channel_class: String,
    pub channel_class_id: i32,
    pub channel_total: String,
    pub channel_total_id: i32,
}

/// Cost fact table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cost {
    pub prod_id: i32,
    pub time_id: NaiveDate,
    pub promo_id: i32,
    pub channel_id: i32,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Box<Channel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod: Option<Box<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo: Option<Box<Promotion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Box<Time>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Country {
    pub country_id: i32,
    pub country_iso_code: String,
    pub country_name: String,
    pub country_subregion: String,
    pub country_subregion_id: i32,
    pub country_region: String,
    pub country_region_id: i32,
    pub country_total: String,
    pub country_total_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub cust_id: i32,
    pub cust_first_name: String,
    pub cust_last_name: String,
    pub cust_gender: String,
    pub cust_year_of_birth: i32,
    #[serde(default)]
    pub cust_marital_status: Option<String>,
    pub cust_street_address: String,
    pub cust_postal_code: String,
    pub cust_city: String,
    pub cust_city_id: i32,
    pub cust_state_province: String,
    pub cust_state_province_id: i32,
    pub country_id: i32,
    pub cust_main_phone_number: String,
    #[serde(default)]
    pub cust_income_level: Option<String>,
    #[serde(default)]
    pub cust_credit_limit: Option<Decimal>,
    #[serde(default)]
    pub cust_email: Option<String>,
    pub cust_total: String,
    pub cust_total_id: i32,
    #[serde(default)]
    pub cust_src_id: Option<i32>,
    #[serde(default)]
    pub cust_eff_from: Option<NaiveDate>,
    #[serde(default)]
    pub cust_eff_to: Option<NaiveDate>,
    #[serde(default)]
    pub cust_valid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Box<Country>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub prod_id: i32,
    pub prod_name: String,
    pub prod_desc: String,
    pub prod_subcategory: String,
    pub prod_subcategory_id: i32,
    pub prod_subcategory_desc: String,
    pub prod_category: String,
    pub prod_category_id: i32,
    pub prod_category_desc: String,
    pub prod_weight_class: i32,
    #[serde(default)]
    pub prod_unit_of_measure: Option<String>,
    pub prod_pack_size: String,
    pub supplier_id: i32,
    pub prod_status: String,
    pub prod_list_price: Decimal,
    pub prod_min_price: Decimal,
    pub prod_total: String,
    pub prod_total_id: i32,
    #[serde(default)]
    pub prod_src_id: Option<i32>,
    #[serde(default)]
    pub prod_eff_from: Option<NaiveDate>,
    #[serde(default)]
    pub prod_eff_to: Option<NaiveDate>,
    #[serde(default)]
    pub prod_valid: Option<String>,
}

/// Not linked to the facts by a declared foreign key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Promotion {
    pub promo_id: i32,
    pub promo_name: String,
    pub promo_subcategory: String,
    pub promo_subcategory_id: i32,
    pub promo_category: String,
    pub promo_category_id: i32,
    pub promo_cost: Decimal,
    pub promo_begin_date: NaiveDate,
    pub promo_end_date: NaiveDate,
    pub promo_total: String,
    pub promo_total_id: i32,
}

/// Sales facts. No primary key; rows are identified by all foreign keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sale {
    pub prod_id: i32,
    pub cust_id: i32,
    pub time_id: NaiveDate,
    pub channel_id: i32,
    pub promo_id: i32,
    pub quantity_sold: i32,
    pub amount_sold: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Box<Channel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cust: Option<Box<Customer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod: Option<Box<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo: Option<Box<Promotion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Box<Time>>,
}

/// Time dimension with calendar and fiscal hierarchies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Time {
    pub time_id: NaiveDate,
    pub day_name: String,
    pub day_number_in_week: i32,
    pub day_number_in_month: i32,
    pub calendar_week_number: i32,
    pub fiscal_week_number: i32,
    pub week_ending_day: NaiveDate,
    pub week_ending_day_id: i32,
    pub calendar_month_number: i32,
    pub fiscal_month_number: i32,
    pub calendar_month_desc: String,
    pub calendar_month_id: i32,
    pub fiscal_month_desc: String,
    pub fiscal_month_id: i32,
    pub days_in_cal_month: Decimal,
    pub days_in_fis_month: Decimal,
    pub end_of_cal_month: NaiveDate,
    pub end_of_fis_month: NaiveDate,
    pub calendar_month_name: String,
    pub fiscal_month_name: String,
    pub calendar_quarter_desc: String,
    pub calendar_quarter_id: i32,
    pub fiscal_quarter_desc: String,
    pub fiscal_quarter_id: i32,
    pub days_in_cal_quarter: Decimal,
    pub days_in_fis_quarter: Decimal,
    pub end_of_cal_quarter: NaiveDate,
    pub end_of_fis_quarter: NaiveDate,
    pub calendar_quarter_number: i32,
    pub fiscal_quarter_number: i32,
    pub calendar_year: i32,
    pub calendar_year_id: i32,
    pub fiscal_year: i32,
    pub fiscal_year_id: i32,
    pub days_in_cal_year: Decimal,
    pub days_in_fis_year: Decimal,
    pub end_of_cal_year: NaiveDate,
    pub end_of_fis_year: NaiveDate,
}

entity!(Channel, "Channel");
entity!(Cost, "Cost");
entity!(Country, "Country");
entity!(Customer, "Customer");
entity!(Product, "Product");
entity!(Promotion, "Promotion");
entity!(Sale, "Sale");
entity!(Time, "Time");
