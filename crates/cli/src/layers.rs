//! GeoJSON layer I/O
//!
//! Reads point/polygon layers into the plain feature model and writes
//! blurred output back out. The legacy `crs` member is honored when a
//! file carries one, so layers exported from desktop GIS keep their
//! CRS tag through the pipeline.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo_types::{Geometry, Polygon};
use geojson::{
    Feature as GjFeature, FeatureCollection as GjFeatureCollection, GeoJson, JsonObject, JsonValue,
};

use epigis_core::{AttributeValue, Crs, Feature, FeatureCollection};

/// Read a GeoJSON FeatureCollection into the plain feature model.
pub fn read_features(path: &Path) -> Result<FeatureCollection> {
    let gj = parse(path)?;
    let mut layer = FeatureCollection::new();
    layer.crs = crs_of(&gj);
    for gj_feature in gj.features {
        layer.push(convert_feature(gj_feature)?);
    }
    Ok(layer)
}

/// Read a polygon layer, flattening multi-polygons into their parts.
pub fn read_polygons(path: &Path) -> Result<(Vec<Polygon<f64>>, Option<Crs>)> {
    let layer = read_features(path)?;
    let crs = layer.crs.clone();

    let mut polygons = Vec::new();
    for (index, feature) in layer.iter().enumerate() {
        match &feature.geometry {
            Some(Geometry::Polygon(p)) => polygons.push(p.clone()),
            Some(Geometry::MultiPolygon(mp)) => polygons.extend(mp.0.iter().cloned()),
            Some(_) => bail!(
                "{}: feature {} is not a polygon",
                path.display(),
                feature.label(index)
            ),
            None => bail!(
                "{}: feature {} has no geometry",
                path.display(),
                feature.label(index)
            ),
        }
    }
    if polygons.is_empty() {
        bail!("{}: no polygons found", path.display());
    }
    Ok((polygons, crs))
}

/// Write features as a GeoJSON FeatureCollection.
pub fn write_features(path: &Path, features: &[Feature], crs: Option<&Crs>) -> Result<()> {
    let gj_features = features
        .iter()
        .map(convert_to_geojson)
        .collect::<Vec<GjFeature>>();
    let fc = GjFeatureCollection {
        bbox: None,
        features: gj_features,
        foreign_members: crs.map(crs_member),
    };
    fs::write(path, GeoJson::from(fc).to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn parse(path: &Path) -> Result<GjFeatureCollection> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("{} is not valid GeoJSON", path.display()))?;
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => bail!("{}: expected a FeatureCollection", path.display()),
    }
}

fn convert_feature(gj: GjFeature) -> Result<Feature> {
    let mut feature = Feature::default();

    if let Some(geometry) = gj.geometry {
        let geom = Geometry::<f64>::try_from(geometry.value)
            .map_err(|e| anyhow!("unsupported geometry: {e}"))?;
        feature.geometry = Some(geom);
    }
    if let Some(properties) = gj.properties {
        for (key, value) in properties {
            feature.set_attribute(key, attribute_from_json(value));
        }
    }
    feature.id = match gj.id {
        Some(geojson::feature::Id::String(s)) => Some(s),
        Some(geojson::feature::Id::Number(n)) => Some(n.to_string()),
        None => None,
    };
    Ok(feature)
}

fn convert_to_geojson(feature: &Feature) -> GjFeature {
    let geometry = feature
        .geometry
        .as_ref()
        .map(|g| geojson::Geometry::new(geojson::Value::from(g)));

    let mut properties = JsonObject::new();
    for (key, value) in &feature.attributes {
        properties.insert(key.clone(), attribute_to_json(value));
    }

    GjFeature {
        bbox: None,
        geometry,
        id: feature.id.clone().map(geojson::feature::Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn attribute_from_json(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        // Arrays and nested objects survive as their JSON text
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Int(i) => JsonValue::from(*i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AttributeValue::String(s) => JsonValue::String(s.clone()),
    }
}

fn crs_of(fc: &GjFeatureCollection) -> Option<Crs> {
    let name = fc
        .foreign_members
        .as_ref()?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    Some(normalize_crs(name))
}

/// Legacy GeoJSON spells EPSG codes as `urn:ogc:def:crs:EPSG::32719`.
fn normalize_crs(name: &str) -> Crs {
    if let Some(idx) = name.rfind(':') {
        let code = &name[idx + 1..];
        if name.to_uppercase().contains("EPSG")
            && !code.is_empty()
            && code.chars().all(|c| c.is_ascii_digit())
        {
            return Crs::from_authid(format!("EPSG:{code}"));
        }
    }
    Crs::from_authid(name)
}

fn crs_member(crs: &Crs) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert(
        "name".to_string(),
        JsonValue::String(crs.authid().to_string()),
    );
    let mut member = JsonObject::new();
    member.insert("type".to_string(), JsonValue::String("name".to_string()));
    member.insert("properties".to_string(), JsonValue::Object(properties));

    let mut root = JsonObject::new();
    root.insert("crs".to_string(), JsonValue::Object(member));
    root
}
